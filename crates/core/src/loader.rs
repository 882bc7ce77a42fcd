//! Object-file loading.
//!
//! Builds a [`SparseImage`], a function table, and a symbol lookup from a
//! Mach-O or ELF binary so the engine can run outside a disassembler host.
//! Mach-O is the primary target (Swift binaries); ELF is supported because
//! it costs one extra match arm.

use std::collections::HashMap;

use goblin::{elf, mach, Object};
use thiserror::Error;

use crate::memory::SparseImage;
use crate::model::Function;
use crate::signatures::SymbolResolver;

/// Error type for object loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Object parse error: {0}")]
    Parse(#[from] goblin::error::Error),
    #[error("Unsupported object format (expected Mach-O or ELF)")]
    Unsupported,
}

/// A loaded binary: mapped sections, function ranges, and symbols.
pub struct LoadedImage {
    image: SparseImage,
    functions: Vec<Function>,
    symbols: HashMap<String, u64>,
}

impl LoadedImage {
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        match Object::parse(bytes)? {
            Object::Elf(ref elf) => Ok(Self::from_elf(elf, bytes)),
            Object::Mach(mach::Mach::Binary(ref bin)) => Ok(Self::from_macho(bin)),
            _ => Err(LoadError::Unsupported),
        }
    }

    pub fn image(&self) -> &SparseImage {
        &self.image
    }

    /// Function ranges recovered from the symbol table, sorted by start.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// The enclosing function for an address, if any.
    pub fn function_containing(&self, addr: u64) -> Option<Function> {
        self.functions.iter().copied().find(|f| f.contains(addr))
    }

    fn from_elf(elf: &elf::Elf, bytes: &[u8]) -> Self {
        let mut image = SparseImage::new();
        let mut section_bounds = Vec::new();
        for sh in &elf.section_headers {
            if sh.sh_flags & u64::from(elf::section_header::SHF_ALLOC) == 0 {
                continue;
            }
            section_bounds.push((sh.sh_addr, sh.sh_addr.saturating_add(sh.sh_size)));
            if sh.sh_type == elf::section_header::SHT_NOBITS {
                continue;
            }
            let start = sh.sh_offset as usize;
            let end = start.saturating_add(sh.sh_size as usize);
            if end <= bytes.len() {
                image.map(sh.sh_addr, bytes[start..end].to_vec());
            }
        }

        let mut symbols = HashMap::new();
        let mut starts = Vec::new();
        for sym in &elf.syms {
            if sym.st_value == 0 {
                continue;
            }
            let Some(name) = elf.strtab.get_at(sym.st_name) else { continue };
            if name.is_empty() {
                continue;
            }
            symbols.insert(name.to_string(), sym.st_value);
            if sym.is_function() && sym.st_shndx != elf::section_header::SHN_UNDEF as usize {
                starts.push((sym.st_value, sym.st_size));
            }
        }

        let functions = functions_from_starts(starts, &section_bounds);
        Self { image, functions, symbols }
    }

    fn from_macho(bin: &mach::MachO) -> Self {
        let mut image = SparseImage::new();
        let mut section_bounds = Vec::new();
        let mut text_bounds = Vec::new();
        for (sec, data) in bin.segments.sections().flatten().filter_map(Result::ok) {
            if sec.size == 0 {
                continue;
            }
            let bounds = (sec.addr, sec.addr.saturating_add(sec.size));
            section_bounds.push(bounds);
            if sec.name().ok() == Some("__text") {
                text_bounds.push(bounds);
            }
            if !data.is_empty() {
                image.map(sec.addr, data.to_vec());
            }
        }

        let mut symbols = HashMap::new();
        let mut starts = Vec::new();
        for sym in bin.symbols() {
            let Ok((name, nlist)) = sym else { continue };
            if nlist.n_value == 0 || name.is_empty() {
                continue;
            }
            // Names are kept verbatim; the signature catalog's keys carry the
            // same leading underscore the symbol table does.
            symbols.insert(name.to_string(), nlist.n_value);
            // nlist carries no size, so anything pointing into __text is
            // treated as a function start.
            if text_bounds.iter().any(|(lo, hi)| nlist.n_value >= *lo && nlist.n_value < *hi) {
                starts.push((nlist.n_value, 0));
            }
        }

        let functions = functions_from_starts(starts, &section_bounds);
        Self { image, functions, symbols }
    }
}

impl SymbolResolver for LoadedImage {
    fn resolve(&self, name: &str) -> Option<u64> {
        self.symbols.get(name).copied()
    }
}

/// Turn `(start, size)` symbol records into sorted `[start, end)` ranges.
/// A zero size means unknown; the end is then the next function start or the
/// containing section's end, whichever comes first.
fn functions_from_starts(mut starts: Vec<(u64, u64)>, sections: &[(u64, u64)]) -> Vec<Function> {
    starts.sort_by_key(|s| s.0);
    starts.dedup_by_key(|s| s.0);

    let mut functions = Vec::with_capacity(starts.len());
    for (i, &(start, size)) in starts.iter().enumerate() {
        let section_end = sections
            .iter()
            .find(|(lo, hi)| start >= *lo && start < *hi)
            .map(|(_, hi)| *hi);
        let next_start = starts.get(i + 1).map(|s| s.0);
        let end = if size > 0 {
            start + size
        } else {
            match (next_start, section_end) {
                (Some(next), Some(sec_end)) => next.min(sec_end),
                (Some(next), None) => next,
                (None, Some(sec_end)) => sec_end,
                (None, None) => continue,
            }
        };
        if end > start {
            functions.push(Function::new(start, end));
        }
    }
    functions
}
