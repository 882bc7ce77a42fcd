//! Literal decoding at resolved data addresses.

use thiserror::Error;

use crate::memory::MemoryImage;
use crate::model::StringLiteral;

/// Upper bound on literal length. A run this long without a terminator is
/// treated the same as one that hits unmapped memory.
const MAX_LITERAL_LEN: usize = 4096;

/// Error type for literal reads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// `addr + offset` is not mapped at all.
    #[error("Literal address {0:#x} is not mapped")]
    Unmapped(u64),
    /// The byte run reaches unmapped memory (or the length cap) without a
    /// terminator.
    #[error("Literal at {0:#x} has no terminator")]
    Unterminated(u64),
    /// The terminated byte run is not valid UTF-8.
    #[error("Literal at {0:#x} is not valid UTF-8")]
    InvalidUtf8(u64),
}

/// Read the null-terminated UTF-8 literal stored at `addr + offset`.
///
/// Pure with respect to the image: identical memory state yields identical
/// output. Nothing is cached; each call re-reads.
pub fn read_string_at(
    image: &dyn MemoryImage,
    addr: u64,
    offset: u64,
) -> Result<StringLiteral, DecodeError> {
    let start = addr.wrapping_add(offset);
    let mut raw = Vec::new();
    loop {
        if raw.len() >= MAX_LITERAL_LEN {
            return Err(DecodeError::Unterminated(start));
        }
        let at = start + raw.len() as u64;
        let byte = match image.read(at, 1) {
            Ok(bytes) => bytes[0],
            Err(_) if raw.is_empty() => return Err(DecodeError::Unmapped(start)),
            Err(_) => return Err(DecodeError::Unterminated(start)),
        };
        if byte == 0 {
            break;
        }
        raw.push(byte);
    }
    let text = String::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8(start))?;
    Ok(StringLiteral { len: text.len(), text })
}
