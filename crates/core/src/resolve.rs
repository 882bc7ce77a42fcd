//! Backward register-value resolution.
//!
//! Given an instruction address and a register, find the register's value at
//! that point and the instruction that produced it. A real disassembler host
//! exposes this as a dataflow query; [`ValueTracker`] is that seam, and
//! [`BackwardScanner`] is the in-crate substitute: a bounded, single-register
//! backward walk that follows direct-assignment chains only.

use thiserror::Error;
use tracing::trace;

use crate::arm64::{Insn, InstructionStore, MovWideOp, Reg, INSN_SIZE, XZR};
use crate::memory::MemoryImage;
use crate::model::Function;

/// A resolved register value and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The register's numeric value at the queried address.
    pub value: u64,
    /// Address of the instruction that most recently assigned that value.
    pub defining_addr: u64,
}

/// Error type for value resolution.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No tracked definition between the function start and the query point,
    /// or the register is redefined by something the walk cannot follow. The
    /// walk fails rather than returning a stale or unrelated address.
    #[error("Register X{reg} could not be resolved at {addr:#x}")]
    Unresolved { addr: u64, reg: Reg },
}

/// Host capability: the value of `reg` immediately before the instruction at
/// `at` executes, searched within `function` only.
pub trait ValueTracker {
    fn resolve(&self, function: &Function, at: u64, reg: Reg) -> Result<Resolution, ResolveError>;
}

/// Locate the instruction that assigned `reg` the exact value `value`.
///
/// Succeeds only when the tracker resolves `reg` to that value; a register
/// that resolves to something else (or not at all) is an error, never a
/// best-guess address.
pub fn resolve_defining_address(
    tracker: &dyn ValueTracker,
    function: &Function,
    at: u64,
    reg: Reg,
    value: u64,
) -> Result<u64, ResolveError> {
    let resolution = tracker.resolve(function, at, reg)?;
    if resolution.value == value {
        Ok(resolution.defining_addr)
    } else {
        Err(ResolveError::Unresolved { addr: at, reg })
    }
}

/// A transformation applied to the chain's base value, recorded while
/// walking backward and replayed in program order once the base is known.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// MOVK: splice `imm16` into bits `[shift, shift+16)`.
    Patch { sf: bool, imm16: u16, shift: u8 },
    /// ADD/SUB immediate relative to the chain's source register.
    Offset { sf: bool, delta: i64 },
}

impl Step {
    fn apply(&self, value: u64) -> u64 {
        let (sf, out) = match *self {
            Step::Patch { sf, imm16, shift } => {
                (sf, (value & !(0xFFFFu64 << shift)) | (u64::from(imm16) << shift))
            }
            Step::Offset { sf, delta } => (sf, value.wrapping_add_signed(delta)),
        };
        if sf {
            out
        } else {
            out & 0xFFFF_FFFF
        }
    }
}

/// Simplified backward scan over the instruction stream.
///
/// Tracks one physical register at a time. The chain may pass through
/// register moves, add/subtract immediates, and MOVK patches; it terminates
/// at a MOVZ/MOVN, an `ORR rd, xzr, #imm`, an ADR/ADRP, or a literal-pool
/// load. The first instruction that redefines the tracked register from
/// outside the chain ends the walk with [`ResolveError::Unresolved`]; so
/// does any intervening call, which may rewrite caller-saved registers.
pub struct BackwardScanner<'a> {
    image: &'a dyn MemoryImage,
}

impl<'a> BackwardScanner<'a> {
    pub fn new(image: &'a dyn MemoryImage) -> Self {
        Self { image }
    }
}

impl ValueTracker for BackwardScanner<'_> {
    fn resolve(&self, function: &Function, at: u64, reg: Reg) -> Result<Resolution, ResolveError> {
        let unresolved = Err(ResolveError::Unresolved { addr: at, reg });
        if reg == XZR || !function.contains(at) {
            return unresolved;
        }

        let store = InstructionStore::new(self.image);
        let mut tracked = reg;
        let mut steps: Vec<Step> = Vec::new();
        let mut defining: Option<u64> = None;
        let mut addr = at;

        while addr.saturating_sub(function.start) >= INSN_SIZE {
            addr -= INSN_SIZE;
            let insn = match store.decode_at(addr) {
                Ok(insn) => insn,
                // An undecodable word could do anything to the register.
                Err(_) => return unresolved,
            };
            trace!(addr = format_args!("{addr:#x}"), tracked, "backward step");

            if let Insn::Call { .. } = insn {
                return unresolved;
            }
            if insn.destination() != Some(tracked) {
                continue;
            }
            let defining_addr = *defining.get_or_insert(addr);

            let base = match insn {
                Insn::MovWide { sf, op: MovWideOp::Movz, imm16, shift, .. } => {
                    let v = u64::from(imm16) << shift;
                    if sf {
                        v
                    } else {
                        v & 0xFFFF_FFFF
                    }
                }
                Insn::MovWide { sf, op: MovWideOp::Movn, imm16, shift, .. } => {
                    let v = !(u64::from(imm16) << shift);
                    if sf {
                        v
                    } else {
                        v & 0xFFFF_FFFF
                    }
                }
                Insn::MovWide { sf, op: MovWideOp::Movk, imm16, shift, .. } => {
                    steps.push(Step::Patch { sf, imm16, shift });
                    continue;
                }
                Insn::MovReg { rm, .. } => {
                    if rm == XZR {
                        0
                    } else {
                        tracked = rm;
                        continue;
                    }
                }
                Insn::AddImm { sf, rn, imm, .. } => {
                    // rn == 31 is SP here, which the walk does not model.
                    if rn == XZR {
                        return unresolved;
                    }
                    steps.push(Step::Offset { sf, delta: imm as i64 });
                    tracked = rn;
                    continue;
                }
                Insn::SubImm { sf, rn, imm, .. } => {
                    if rn == XZR {
                        return unresolved;
                    }
                    steps.push(Step::Offset { sf, delta: -(imm as i64) });
                    tracked = rn;
                    continue;
                }
                Insn::OrrImm { sf, rn, imm, .. } => {
                    // Only the `MOV rd, #imm` alias is a direct assignment.
                    if rn != XZR {
                        return unresolved;
                    }
                    if sf {
                        imm
                    } else {
                        imm & 0xFFFF_FFFF
                    }
                }
                Insn::LdrLit { sf, target, .. } => {
                    let loaded = if sf {
                        self.image.read_u64_le(target)
                    } else {
                        self.image.read_u32_le(target).map(u64::from)
                    };
                    match loaded {
                        Ok(v) => v,
                        Err(_) => return unresolved,
                    }
                }
                Insn::Adr { target, .. } | Insn::Adrp { target, .. } => target,
                // Loads from computed addresses, arithmetic on untracked
                // sources, and anything unrecognized end the chain.
                _ => return unresolved,
            };

            // Replay the recorded transformations in program order.
            let value = steps.iter().rev().fold(base, |v, step| step.apply(v));
            return Ok(Resolution { value, defining_addr });
        }

        unresolved
    }
}
