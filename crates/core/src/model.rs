//! Core data model: functions, match sites, and recovered literals.

use serde::{Deserialize, Serialize};

/// A contiguous `[start, end)` code range; the unit of a scan.
///
/// Functions are supplied externally (by the host's function locator or an
/// object file's symbol table); the engine never discovers them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub start: u64,
    pub end: u64,
}

impl Function {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Length of the function's byte range. Zero for degenerate ranges.
    pub fn byte_len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// One pattern hit inside a function, enriched as the pipeline progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSite {
    /// Address where the byte pattern matched (the SUB instruction).
    pub match_addr: u64,
    /// Address the derived comment attaches to (the ORR instruction).
    pub target_addr: u64,
    /// The flagged register's numeric value, once resolved.
    pub resolved_value: Option<u64>,
    /// Address of the instruction that produced that value.
    pub defining_addr: Option<u64>,
}

impl MatchSite {
    pub fn new(match_addr: u64, target_addr: u64) -> Self {
        Self { match_addr, target_addr, resolved_value: None, defining_addr: None }
    }
}

/// A literal pulled out of the image: decoded text plus its raw byte length.
///
/// Computed lazily per site and discarded after annotation; the engine never
/// persists literals itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringLiteral {
    /// Byte length of the literal's contents (terminator excluded).
    pub len: usize,
    pub text: String,
}
