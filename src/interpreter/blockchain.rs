//! Environmental and block-information opcodes.
//!
//! `CALLVALUE`, `CALLDATASIZE` and `CALLDATALOAD` read the supplied call
//! context; every other query pushes the fixed sentinel so dependent
//! control flow stays driven by calldata and pushed constants.

use super::memory::mem_range;
use super::{sentinel, Emulator};
use crate::call::CallInfo;
use crate::crypto;
use crate::error::FaultReason;
use crate::opcode::Opcode;
use crate::state::{ExecuteState, HaltReason, VmState};

use primitive_types::U256;

impl Emulator {
    /// Push an abstract program input: the value is `value`, the SSA record
    /// only names the producing opcode.
    pub(crate) fn push_input(
        &mut self,
        state: &mut VmState,
        index: usize,
        op: Opcode,
        value: U256,
    ) -> Result<ExecuteState, FaultReason> {
        let id = self.ssa.input(op);
        self.annotations[index] = Some(id);
        state.push(value, id)?;

        Ok(ExecuteState::Proceed)
    }

    pub(crate) fn op_environmental(
        &mut self,
        callinfo: &CallInfo,
        state: &mut VmState,
        index: usize,
        op: Opcode,
    ) -> Result<ExecuteState, FaultReason> {
        match op {
            Opcode::CALLDATASIZE => self.push_input(state, index, op, callinfo.size()),
            Opcode::CALLVALUE => self.push_input(state, index, op, callinfo.callvalue()),

            Opcode::ADDRESS
            | Opcode::ORIGIN
            | Opcode::CALLER
            | Opcode::CODESIZE
            | Opcode::GASPRICE
            | Opcode::RETURNDATASIZE => self.push_input(state, index, op, sentinel()),

            Opcode::CALLDATALOAD => {
                let (offset, ssa) = state.pop()?;
                let id = self.ssa.computed(op, vec![ssa]);
                self.annotations[index] = Some(id);
                state.push(callinfo.load_word(offset), id)?;

                Ok(ExecuteState::Proceed)
            }

            Opcode::BALANCE | Opcode::EXTCODESIZE => {
                let (_, ssa) = state.pop()?;
                let id = self.ssa.computed(op, vec![ssa]);
                self.annotations[index] = Some(id);
                state.push(sentinel(), id)?;

                Ok(ExecuteState::Proceed)
            }

            // Copies land as zeros; the data they would carry is not
            // modeled. CODECOPY is the exception: the program bytes are
            // known exactly.
            Opcode::CALLDATACOPY | Opcode::RETURNDATACOPY => {
                let items = state.pop_n(3)?;
                let (dest, len) = mem_range(items[0].0, items[2].0)?;
                state.memory.write_range(dest, &vec![0; len]);

                Ok(ExecuteState::Proceed)
            }

            Opcode::CODECOPY => {
                let items = state.pop_n(3)?;
                let (dest, len) = mem_range(items[0].0, items[2].0)?;
                let src = items[1].0;

                let bytes: Vec<u8> = (0..len)
                    .map(|i| {
                        if src > U256::from(usize::MAX as u64) {
                            return 0;
                        }
                        (src.low_u64() as usize)
                            .checked_add(i)
                            .and_then(|p| self.code.get(p))
                            .copied()
                            .unwrap_or(0)
                    })
                    .collect();
                state.memory.write_range(dest, &bytes);

                Ok(ExecuteState::Proceed)
            }

            Opcode::EXTCODECOPY => {
                let items = state.pop_n(4)?;
                let (dest, len) = mem_range(items[1].0, items[3].0)?;
                state.memory.write_range(dest, &vec![0; len]);

                Ok(ExecuteState::Proceed)
            }

            _ => Ok(ExecuteState::Halt(HaltReason::InvalidInstruction)),
        }
    }

    pub(crate) fn op_block_info(
        &mut self,
        state: &mut VmState,
        index: usize,
        op: Opcode,
    ) -> Result<ExecuteState, FaultReason> {
        match op {
            Opcode::BLOCKHASH => {
                let (_, ssa) = state.pop()?;
                let id = self.ssa.computed(op, vec![ssa]);
                self.annotations[index] = Some(id);
                state.push(sentinel(), id)?;

                Ok(ExecuteState::Proceed)
            }

            _ => self.push_input(state, index, op, sentinel()),
        }
    }

    /// `SHA3`: hash the addressed memory range and push the digest.
    pub(crate) fn op_sha3(
        &mut self,
        state: &mut VmState,
        index: usize,
    ) -> Result<ExecuteState, FaultReason> {
        let items = state.pop_n(2)?;
        let args = vec![items[0].1, items[1].1];

        let id = self.ssa.computed(Opcode::SHA3, args);
        self.annotations[index] = Some(id);

        let (offset, len) = mem_range(items[0].0, items[1].0)?;
        let digest = crypto::keccak256(&state.memory.read_range(offset, len));
        state.push(digest, id)?;

        Ok(ExecuteState::Proceed)
    }
}
