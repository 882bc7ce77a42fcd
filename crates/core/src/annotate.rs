//! Comment emission at the raw-instruction and decompiled levels.
//!
//! The raw level always takes the comment. The decompiled level is
//! best-effort: the host maps an address to zero or more statement
//! locations, and each location offers several attachment points that may
//! reject a comment by leaving it orphaned. The emitter walks candidates in
//! a fixed priority order and stops at the first accepted placement; when
//! everything is rejected it keeps the raw comment and logs the miss.

use serde::Serialize;
use tracing::debug;

/// Candidate placement of a comment within a decompiled statement, in the
/// order the emitter tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachPoint {
    /// After the statement's terminating semicolon.
    StatementEnd,
    /// After an opening brace.
    BlockOpen,
    /// After a closing brace.
    BlockClose,
    /// After a case/label colon.
    Label,
}

impl AttachPoint {
    /// Priority order for placement attempts.
    pub const PRIORITY: [AttachPoint; 4] = [
        AttachPoint::StatementEnd,
        AttachPoint::BlockOpen,
        AttachPoint::BlockClose,
        AttachPoint::Label,
    ];
}

/// Raw-disassembly comment store. Setting a comment overwrites any previous
/// text at that address; it never appends.
pub trait CommentSink {
    fn set_comment(&mut self, addr: u64, text: &str);
}

/// Decompiled-form side of the host: address-to-statement mapping plus
/// comment placement and persistence.
pub trait DecompiledFormProvider {
    /// Statement locations corresponding to a raw address, best candidate
    /// first. Empty when the mapping is ambiguous-to-nothing or no
    /// decompiled form is available.
    fn statements_for(&mut self, addr: u64) -> Vec<u64>;

    /// Try one placement. Returns `false` when the comment would be left
    /// orphaned (unattached to any visible statement).
    fn try_attach(&mut self, stmt: u64, point: AttachPoint, text: &str) -> bool;

    /// Commit comments set so far to the host.
    fn save(&mut self);
}

/// Everything the emitter writes through. Blanket-implemented so a single
/// host object can be passed as one `&mut dyn` reference.
pub trait AnnotationHost: CommentSink + DecompiledFormProvider {}

impl<T: CommentSink + DecompiledFormProvider> AnnotationHost for T {}

/// Terminal annotation state for one address.
///
/// The per-address lifecycle is
/// `Unannotated -> RawCommentSet -> {DecompiledCommentSet | DecompiledCommentOrphaned}`;
/// both terminals keep the raw comment, and orphaning is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationOutcome {
    /// A decompiled placement was accepted.
    DecompiledCommentSet,
    /// Raw comment only; every decompiled placement was rejected or no
    /// decompiled form exists.
    DecompiledCommentOrphaned,
}

/// Attach `text` to `addr` at both levels through `host`.
///
/// Re-annotating an address replaces the previous comment at both levels.
pub fn annotate(host: &mut dyn AnnotationHost, addr: u64, text: &str) -> AnnotationOutcome {
    host.set_comment(addr, text);

    let statements = host.statements_for(addr);
    if statements.is_empty() {
        debug!(addr = format_args!("{addr:#x}"), "no decompiled statement for address");
        return AnnotationOutcome::DecompiledCommentOrphaned;
    }

    for stmt in statements {
        for point in AttachPoint::PRIORITY {
            if host.try_attach(stmt, point, text) {
                host.save();
                return AnnotationOutcome::DecompiledCommentSet;
            }
        }
    }

    // Hosts that set before checking leave the last attempt's comment
    // behind; keep whatever stuck and persist it anyway.
    debug!(addr = format_args!("{addr:#x}"), "all decompiled placements orphaned");
    host.save();
    AnnotationOutcome::DecompiledCommentOrphaned
}
