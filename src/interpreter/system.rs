//! System opcodes: contract creation, calls, returns and halts.
//!
//! Calls do not recurse. The CALL family pops its declared operands and
//! pushes the sentinel as its result, so paths that inspect call results
//! keep executing.

use super::memory::mem_range;
use super::{sentinel, Emulator};
use crate::error::FaultReason;
use crate::opcode::Opcode;
use crate::state::{ExecuteState, HaltReason, VmState};

impl Emulator {
    pub(crate) fn op_system(
        &mut self,
        state: &mut VmState,
        index: usize,
        op: Opcode,
    ) -> Result<ExecuteState, FaultReason> {
        match op {
            Opcode::CREATE
            | Opcode::CALL
            | Opcode::CALLCODE
            | Opcode::DELEGATECALL
            | Opcode::STATICCALL => {
                let items = state.pop_n(op.pops())?;
                let args = items.into_iter().map(|(_, ssa)| ssa).collect();

                let id = self.ssa.computed(op, args);
                self.annotations[index] = Some(id);

                state.last_returned.clear();
                state.push(sentinel(), id)?;

                Ok(ExecuteState::Proceed)
            }

            Opcode::RETURN | Opcode::REVERT => {
                let items = state.pop_n(2)?;
                let (offset, len) = mem_range(items[0].0, items[1].0)?;
                state.last_returned = state.memory.read_range(offset, len);

                let reason = if op == Opcode::RETURN {
                    HaltReason::Return
                } else {
                    HaltReason::Revert
                };

                Ok(ExecuteState::Halt(reason))
            }

            Opcode::SELFDESTRUCT => {
                state.pop()?;

                Ok(ExecuteState::Halt(HaltReason::SelfDestruct))
            }

            _ => Ok(ExecuteState::Halt(HaltReason::InvalidInstruction)),
        }
    }

    /// `LOG0..LOG4`: stack effects only; the log payload is not modeled.
    pub(crate) fn op_log(
        &mut self,
        state: &mut VmState,
        op: Opcode,
    ) -> Result<ExecuteState, FaultReason> {
        state.pop_n(op.pops())?;

        Ok(ExecuteState::Proceed)
    }
}
