//! Per-step execution records for observability.

use crate::opcode::Opcode;
use crate::storage::Storage;

use itertools::Itertools;
use primitive_types::U256;

use std::fmt;

/// Snapshot taken after one instruction executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    step: usize,
    offset: usize,
    op: Opcode,
    stack: Vec<U256>,
    storage: Storage,
}

impl TraceStep {
    pub(crate) fn new(
        step: usize,
        offset: usize,
        op: Opcode,
        stack: Vec<U256>,
        storage: Storage,
    ) -> Self {
        Self {
            step,
            offset,
            op,
            stack,
            storage,
        }
    }

    /// Position of the step in the run, starting at zero.
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Byte offset of the executed instruction.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn op(&self) -> Opcode {
        self.op
    }

    /// Concrete stack after the instruction, bottom first.
    pub fn stack(&self) -> &[U256] {
        &self.stack
    }

    /// Storage after the instruction.
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.stack.iter().map(|v| format!("{v:#x}")).join(", ");

        write!(
            f,
            "#{} {:#06x} {} stack=[{}] storage={}",
            self.step, self.offset, self.op, stack, self.storage
        )
    }
}
