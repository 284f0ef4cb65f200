//! Emulation and disassembly error types.

use crate::opcode::Opcode;

use primitive_types::U256;
use thiserror::Error;

/// Fatal errors while turning hex text into an instruction sequence.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DisassemblyError {
    /// The input is not a well-formed hex byte string.
    #[error("malformed bytecode: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// A PUSH immediate runs past the end of the bytecode.
    #[error("truncated PUSH{width} immediate at offset {offset:#x}")]
    TruncatedPush {
        /// Byte offset of the PUSH opcode.
        offset: usize,
        /// Declared immediate width, in bytes.
        width: u8,
    },
}

/// Context-free description of why an emulation path faulted.
///
/// A [`Fault`] binds one of these to the faulting instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FaultReason {
    /// Pop on a stack with too few items. Checked before either stack is
    /// mutated, so a faulting instruction leaves both stacks untouched.
    #[error("stack underflow")]
    StackUnderflow,
    /// Push beyond the maximum stack depth.
    #[error("stack limit exceeded")]
    StackOverflow,
    /// Resolved jump target is not a `JUMPDEST`.
    #[error("jump target {target:#x} is not a JUMPDEST")]
    BadJump {
        /// The resolved target byte offset.
        target: U256,
    },
    /// The jump target's SSA expression does not reduce to a constant.
    #[error("unresolved indirect jump target: {expr}")]
    UnresolvedJump {
        /// Formatted SSA expression of the target.
        expr: String,
    },
    /// A memory access would grow memory past the configured ceiling.
    #[error("memory access at {at:#x} exceeds the memory ceiling")]
    MemoryLimitExceeded {
        /// The offending pointer.
        at: U256,
    },
}

/// A fault bound to the instruction that raised it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason} [offset {offset:#x}, {op}]")]
pub struct Fault {
    offset: usize,
    op: Opcode,
    #[source]
    reason: FaultReason,
}

impl Fault {
    pub(crate) const fn new(offset: usize, op: Opcode, reason: FaultReason) -> Self {
        Self { offset, op, reason }
    }

    /// Byte offset of the faulting instruction.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Opcode of the faulting instruction.
    pub const fn op(&self) -> Opcode {
        self.op
    }

    /// The context-free fault description.
    pub const fn reason(&self) -> &FaultReason {
        &self.reason
    }
}

/// Stack discipline violations, raised by [`crate::state::VmState`] and
/// mapped onto [`FaultReason`] by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackError {
    Underflow,
    Overflow,
}

impl From<StackError> for FaultReason {
    fn from(e: StackError) -> Self {
        match e {
            StackError::Underflow => Self::StackUnderflow,
            StackError::Overflow => Self::StackOverflow,
        }
    }
}
