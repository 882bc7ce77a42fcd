//! Read-only access to the analyzed program's byte space.
//!
//! The engine never owns the program image in a real host; it reads bytes
//! through whatever the host provides. `MemoryImage` is that seam, and
//! `SparseImage` is the in-crate implementation used by tests, the CLI, and
//! the object-file loader.

use thiserror::Error;

/// Error type for image reads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// The requested range is not (fully) covered by a mapped segment.
    #[error("Unmapped read of {len} bytes at {addr:#x}")]
    Unmapped { addr: u64, len: usize },
}

/// Convenience result type for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Read-only view over the full addressable byte space of the binary under
/// analysis. Implementations must be side-effect free: reading never mutates
/// the image.
pub trait MemoryImage {
    /// Return exactly `len` bytes starting at `addr`, or fail if any byte in
    /// the range is unmapped.
    fn read(&self, addr: u64, len: usize) -> MemoryResult<&[u8]>;

    /// Whether a single byte at `addr` is mapped.
    fn is_mapped(&self, addr: u64) -> bool {
        self.read(addr, 1).is_ok()
    }

    /// Read a little-endian 32-bit word (one ARM64 instruction).
    fn read_u32_le(&self, addr: u64) -> MemoryResult<u32> {
        let bytes = self.read(addr, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(word))
    }

    /// Read a little-endian 64-bit word.
    fn read_u64_le(&self, addr: u64) -> MemoryResult<u64> {
        let bytes = self.read(addr, 8)?;
        let mut word = [0u8; 8];
        word.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(word))
    }
}

/// A set of disjoint `(base, bytes)` segments, kept sorted by base address.
///
/// Good enough to stand in for a loaded binary: code and data live in
/// separate segments with arbitrary gaps between them.
#[derive(Debug, Default, Clone)]
pub struct SparseImage {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
struct Segment {
    base: u64,
    bytes: Vec<u8>,
}

impl Segment {
    fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    fn contains_range(&self, addr: u64, len: usize) -> bool {
        addr >= self.base && addr + len as u64 <= self.end()
    }
}

impl SparseImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `bytes` at `base`. Segments are expected to be disjoint; a read
    /// is served by whichever segment fully contains it.
    pub fn map(&mut self, base: u64, bytes: impl Into<Vec<u8>>) {
        self.segments.push(Segment { base, bytes: bytes.into() });
        self.segments.sort_by_key(|s| s.base);
    }

    /// Number of mapped segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl MemoryImage for SparseImage {
    fn read(&self, addr: u64, len: usize) -> MemoryResult<&[u8]> {
        for seg in self.segments.iter().rev() {
            if seg.contains_range(addr, len) {
                let start = (addr - seg.base) as usize;
                return Ok(&seg.bytes[start..start + len]);
            }
        }
        Err(MemoryError::Unmapped { addr, len })
    }
}
