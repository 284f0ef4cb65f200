//! Stack, memory and storage bridge opcodes.

use super::{sentinel, Emulator};
use crate::consts::{VM_MAX_MEMORY, WORD_SIZE};
use crate::error::FaultReason;
use crate::opcode::Opcode;
use crate::state::{ExecuteState, HaltReason, VmState};

use primitive_types::U256;

/// Check an `offset`/`len` pair against the memory ceiling and narrow both
/// to buffer indices. Zero-length accesses are always in range.
pub(crate) fn mem_range(offset: U256, len: U256) -> Result<(usize, usize), FaultReason> {
    if len.is_zero() {
        return Ok((0, 0));
    }

    let ceiling = U256::from(VM_MAX_MEMORY);
    if len > ceiling || offset > ceiling - len {
        return Err(FaultReason::MemoryLimitExceeded { at: offset });
    }

    Ok((offset.low_u64() as usize, len.low_u64() as usize))
}

/// Narrow a 32-byte word access against the memory ceiling.
pub(crate) fn mem_word(offset: U256) -> Result<usize, FaultReason> {
    mem_range(offset, U256::from(WORD_SIZE)).map(|(offset, _)| offset)
}

impl Emulator {
    pub(crate) fn op_stack_memory_storage(
        &mut self,
        state: &mut VmState,
        index: usize,
        op: Opcode,
    ) -> Result<ExecuteState, FaultReason> {
        match op {
            Opcode::POP => {
                state.pop()?;

                Ok(ExecuteState::Proceed)
            }

            Opcode::MLOAD => {
                let (offset, ssa) = state.pop()?;
                let id = self.ssa.computed(op, vec![ssa]);
                self.annotations[index] = Some(id);

                let value = state.memory.mload(mem_word(offset)?);
                state.push(value, id)?;

                Ok(ExecuteState::Proceed)
            }

            Opcode::MSTORE => {
                let items = state.pop_n(2)?;
                state.memory.mstore(mem_word(items[0].0)?, items[1].0);

                Ok(ExecuteState::Proceed)
            }

            Opcode::MSTORE8 => {
                let items = state.pop_n(2)?;
                let (offset, _) = mem_range(items[0].0, U256::one())?;
                state.memory.mstore8(offset, items[1].0);

                Ok(ExecuteState::Proceed)
            }

            Opcode::SLOAD => {
                let (key, ssa) = state.pop()?;
                let id = self.ssa.computed(op, vec![ssa]);
                self.annotations[index] = Some(id);

                let value = state.storage.sload(&key);
                state.push(value, id)?;

                Ok(ExecuteState::Proceed)
            }

            Opcode::SSTORE => {
                let items = state.pop_n(2)?;
                state.storage.sstore(items[0].0, items[1].0);

                Ok(ExecuteState::Proceed)
            }

            Opcode::PC | Opcode::MSIZE | Opcode::GAS => {
                self.push_input(state, index, op, sentinel())
            }

            _ => Ok(ExecuteState::Halt(HaltReason::InvalidInstruction)),
        }
    }
}
