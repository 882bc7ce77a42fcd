//! In-memory host implementations.
//!
//! Useful until (and instead of) a real disassembler host: the engine's
//! host seams are all implemented here over plain maps, so the whole
//! pipeline runs against synthetic byte streams with no external tooling.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::annotate::{AttachPoint, CommentSink, DecompiledFormProvider};
use crate::signatures::{SymbolResolver, TypeApplier};

/// Scripted stand-in for the disassembler host: raw comments, a synthetic
/// decompiled form, and a symbol table.
///
/// By default no decompiled form exists (every annotation ends up
/// raw-only). Tests script one with [`ScriptedHost::map_statement`] and
/// [`ScriptedHost::accept_at`].
#[derive(Debug, Default)]
pub struct ScriptedHost {
    comments: BTreeMap<u64, String>,
    statements: HashMap<u64, Vec<u64>>,
    accepted: HashSet<(u64, AttachPoint)>,
    decompiled: HashMap<(u64, AttachPoint), String>,
    save_count: usize,
    symbols: HashMap<String, u64>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a raw address to its decompiled statement locations.
    pub fn map_statement(&mut self, addr: u64, statements: impl Into<Vec<u64>>) {
        self.statements.insert(addr, statements.into());
    }

    /// Declare that a placement at `(stmt, point)` is accepted rather than
    /// orphaned.
    pub fn accept_at(&mut self, stmt: u64, point: AttachPoint) {
        self.accepted.insert((stmt, point));
    }

    pub fn define_symbol(&mut self, name: impl Into<String>, addr: u64) {
        self.symbols.insert(name.into(), addr);
    }

    /// The raw-level comment at `addr`, if one was set.
    pub fn raw_comment(&self, addr: u64) -> Option<&str> {
        self.comments.get(&addr).map(String::as_str)
    }

    /// The decompiled-level comment at a placement, if one stuck.
    pub fn decompiled_comment(&self, stmt: u64, point: AttachPoint) -> Option<&str> {
        self.decompiled.get(&(stmt, point)).map(String::as_str)
    }

    /// How many times the decompiled form was persisted.
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl CommentSink for ScriptedHost {
    fn set_comment(&mut self, addr: u64, text: &str) {
        self.comments.insert(addr, text.to_string());
    }
}

impl DecompiledFormProvider for ScriptedHost {
    fn statements_for(&mut self, addr: u64) -> Vec<u64> {
        self.statements.get(&addr).cloned().unwrap_or_default()
    }

    fn try_attach(&mut self, stmt: u64, point: AttachPoint, text: &str) -> bool {
        // The comment is written before the orphan check, as real hosts do.
        self.decompiled.insert((stmt, point), text.to_string());
        self.accepted.contains(&(stmt, point))
    }

    fn save(&mut self) {
        self.save_count += 1;
    }
}

impl SymbolResolver for ScriptedHost {
    fn resolve(&self, name: &str) -> Option<u64> {
        self.symbols.get(name).copied()
    }
}

/// Type applier that records what the engine asked for.
#[derive(Debug, Default)]
pub struct RecordingApplier {
    pub declarations: Vec<String>,
    pub applied: Vec<(u64, String)>,
    /// Addresses whose prototypes the host should reject.
    pub reject: HashSet<u64>,
}

impl RecordingApplier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TypeApplier for RecordingApplier {
    fn declare_types(&mut self, decls: &str) {
        self.declarations.push(decls.to_string());
    }

    fn apply(&mut self, addr: u64, prototype: &str) -> bool {
        if self.reject.contains(&addr) {
            return false;
        }
        self.applied.push((addr, prototype.to_string()));
        true
    }
}
