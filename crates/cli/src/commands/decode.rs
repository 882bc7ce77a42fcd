use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use swiftlit_core::arm64::InstructionStore;
use swiftlit_core::memory::{MemoryImage, SparseImage};

use swiftlit::parse_address;

/// Decode and print one instruction word from a raw image.
pub fn decode_command(image: &str, base: &str, addr: &str) -> Result<()> {
    let image_path = Path::new(image);
    let base = parse_address(base)?;
    let addr = parse_address(addr)?;

    let bytes = fs::read(image_path)
        .with_context(|| format!("Failed to read image at {}", image_path.display()))?;
    let mut sparse = SparseImage::new();
    sparse.map(base, bytes);

    let word = sparse
        .read_u32_le(addr)
        .with_context(|| format!("No instruction bytes mapped at {addr:#x}"))?;
    let insn = InstructionStore::new(&sparse)
        .decode_at(addr)
        .with_context(|| format!("Failed to decode the word at {addr:#x}"))?;

    println!("{addr:#x}: {word:08x}  {insn}");
    Ok(())
}
