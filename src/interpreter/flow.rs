//! Jump resolution and control-transfer recording.

use super::Emulator;
use crate::cfg::EdgeKind;
use crate::error::FaultReason;
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::ssa::SsaId;
use crate::state::{ExecuteState, VmState};

use primitive_types::U256;
use tracing::trace;

/// One observed transfer of control between instruction offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlTransfer {
    from: usize,
    to: usize,
    kind: EdgeKind,
}

impl ControlTransfer {
    /// Byte offset of the branching instruction.
    pub const fn from(&self) -> usize {
        self.from
    }

    /// Byte offset of the target instruction.
    pub const fn to(&self) -> usize {
        self.to
    }

    pub const fn kind(&self) -> EdgeKind {
        self.kind
    }
}

impl Emulator {
    /// Reduce the SSA expression of a jump target to a concrete offset.
    fn resolve_target(&self, ssa: SsaId) -> Result<U256, FaultReason> {
        self.ssa.evaluate(ssa).ok_or_else(|| FaultReason::UnresolvedJump {
            expr: self.ssa.format(ssa),
        })
    }

    /// Map a resolved byte offset onto the instruction sequence, requiring
    /// the target to be a `JUMPDEST`.
    fn jumpdest_index(&self, target: U256) -> Result<usize, FaultReason> {
        if target > U256::from(u32::MAX) {
            return Err(FaultReason::BadJump { target });
        }

        let offset = target.low_u64() as usize;
        let index = *self
            .offset_index
            .get(&offset)
            .ok_or(FaultReason::BadJump { target })?;

        if self.instructions[index].opcode() != Opcode::JUMPDEST {
            return Err(FaultReason::BadJump { target });
        }

        Ok(index)
    }

    fn record_transfer(&mut self, from: usize, to: usize, kind: EdgeKind) {
        trace!("transfer {:#x} -> {:#x} [{}]", from, to, kind);
        self.transfers.push(ControlTransfer { from, to, kind });
    }

    pub(crate) fn op_jump(
        &mut self,
        state: &mut VmState,
        instr: &Instruction,
    ) -> Result<ExecuteState, FaultReason> {
        let (_, ssa) = state.pop()?;

        let target = self.resolve_target(ssa)?;
        let index = self.jumpdest_index(target)?;
        let target_offset = self.instructions[index].offset();

        self.record_transfer(instr.offset(), target_offset, EdgeKind::Unconditional);
        state.pc = index;

        Ok(ExecuteState::Proceed)
    }

    /// Pop `target`, then `condition`. Both outgoing edges are recorded;
    /// the taken one is decided by the concrete condition.
    pub(crate) fn op_jumpi(
        &mut self,
        state: &mut VmState,
        instr: &Instruction,
    ) -> Result<ExecuteState, FaultReason> {
        let items = state.pop_n(2)?;
        let target_ssa = items[0].1;
        let condition = items[1].0;

        let target = self.resolve_target(target_ssa)?;
        let index = self.jumpdest_index(target)?;
        let target_offset = self.instructions[index].offset();

        self.record_transfer(instr.offset(), target_offset, EdgeKind::ConditionalTrue);
        self.record_transfer(
            instr.offset(),
            instr.end_offset() + 1,
            EdgeKind::ConditionalFalse,
        );

        if !condition.is_zero() {
            state.pc = index;
        }

        Ok(ExecuteState::Proceed)
    }
}
