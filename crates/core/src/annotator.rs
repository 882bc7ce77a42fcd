//! The end-to-end annotation pass for one function.
//!
//! Control flow: enumerate pattern sites in the function, resolve the
//! flagged register at each site, read the literal the resolved pointer
//! refers to, and attach it as a comment. The pass is best-effort per site:
//! a site that fails to decode, resolve, or read is logged, recorded in the
//! report, and skipped; it never aborts the scan.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::annotate::{self, AnnotationHost, AnnotationOutcome};
use crate::arm64::{Insn, InstructionStore, INSN_SIZE};
use crate::literal;
use crate::memory::{MemoryError, MemoryImage};
use crate::model::{Function, MatchSite, StringLiteral};
use crate::pattern::{self, BytePattern, PatternError};
use crate::resolve::ValueTracker;

/// Byte template for a materialized Swift string constant:
/// `SUB Rd, Rt, #0x20` immediately followed by
/// `ORR X1, X8, #0x8000000000000000`.
pub const SWIFT_STRING_SITE: &str = "?? ?? 00 D1 ?? ?? 41 B2";

/// Offset from the resolved base pointer to the literal's first byte.
pub const LITERAL_OFFSET: u64 = 0x20;

/// Why a candidate site produced no annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Site bytes do not decode to the expected instruction classes.
    Malformed(String),
    /// No defining assignment for the flagged register within the function.
    Unresolved(String),
    /// The bytes at the resolved address are not a valid literal.
    Decode(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Malformed(msg) => write!(f, "malformed site: {msg}"),
            SkipReason::Unresolved(msg) => write!(f, "unresolved register: {msg}"),
            SkipReason::Decode(msg) => write!(f, "literal decode failed: {msg}"),
        }
    }
}

/// Outcome for one match site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub site: MatchSite,
    pub literal: Option<StringLiteral>,
    pub annotation: Option<AnnotationOutcome>,
    pub skipped: Option<SkipReason>,
}

impl SiteReport {
    fn skipped(site: MatchSite, reason: SkipReason) -> Self {
        Self { site, literal: None, annotation: None, skipped: Some(reason) }
    }
}

/// Summary of one annotation pass over a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    pub function: Function,
    pub sites: Vec<SiteReport>,
}

impl AnnotationReport {
    /// Sites that produced a comment.
    pub fn annotated(&self) -> usize {
        self.sites.iter().filter(|s| s.annotation.is_some()).count()
    }

    /// Sites skipped with a reason.
    pub fn skipped(&self) -> usize {
        self.sites.iter().filter(|s| s.skipped.is_some()).count()
    }
}

/// Error type for whole-pass failures. Per-site failures never surface here.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// The function's byte range could not be read.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Scans functions for Swift string sites and annotates what it can recover.
pub struct SwiftStringAnnotator<'a> {
    image: &'a dyn MemoryImage,
    tracker: &'a dyn ValueTracker,
}

impl<'a> SwiftStringAnnotator<'a> {
    pub fn new(image: &'a dyn MemoryImage, tracker: &'a dyn ValueTracker) -> Self {
        Self { image, tracker }
    }

    /// Run one pass over `function`, writing comments through `host`.
    ///
    /// Re-running the pass on an already-annotated function rewrites the
    /// same comments; it never duplicates them.
    pub fn annotate_function(
        &self,
        function: &Function,
        host: &mut dyn AnnotationHost,
    ) -> Result<AnnotationReport, AnnotatorError> {
        let template = BytePattern::parse(SWIFT_STRING_SITE)?;
        let matches: Vec<u64> =
            pattern::find_matches(self.image, function, &template)?.collect();
        debug!(
            function = format_args!("{:#x}", function.start),
            candidates = matches.len(),
            "scanned for string sites"
        );

        let mut sites = Vec::with_capacity(matches.len());
        for match_addr in matches {
            let report = self.process_site(function, match_addr, host);
            if let Some(reason) = &report.skipped {
                warn!(site = format_args!("{match_addr:#x}"), ?reason, "site skipped");
            }
            sites.push(report);
        }
        Ok(AnnotationReport { function: *function, sites })
    }

    fn process_site(
        &self,
        function: &Function,
        match_addr: u64,
        host: &mut dyn AnnotationHost,
    ) -> SiteReport {
        // The comment target is the second instruction of the template.
        let target_addr = match_addr + INSN_SIZE;
        let mut site = MatchSite::new(match_addr, target_addr);

        if !function.contains(target_addr) {
            return SiteReport::skipped(
                site,
                SkipReason::Malformed(format!("pattern tail {target_addr:#x} outside function")),
            );
        }

        let store = InstructionStore::new(self.image);
        let flagged = match store.decode_at(target_addr) {
            Ok(Insn::OrrImm { rn, .. }) => rn,
            Ok(other) => {
                return SiteReport::skipped(
                    site,
                    SkipReason::Malformed(format!("expected ORR immediate, found {other}")),
                );
            }
            Err(err) => return SiteReport::skipped(site, SkipReason::Malformed(err.to_string())),
        };

        let resolution = match self.tracker.resolve(function, target_addr, flagged) {
            Ok(resolution) => resolution,
            Err(err) => return SiteReport::skipped(site, SkipReason::Unresolved(err.to_string())),
        };
        site.resolved_value = Some(resolution.value);
        site.defining_addr = Some(resolution.defining_addr);

        let literal = match literal::read_string_at(self.image, resolution.value, LITERAL_OFFSET) {
            Ok(literal) => literal,
            Err(err) => return SiteReport::skipped(site, SkipReason::Decode(err.to_string())),
        };

        let outcome = annotate::annotate(host, target_addr, &literal.text);
        SiteReport { site, literal: Some(literal), annotation: Some(outcome), skipped: None }
    }
}
