//! Main dispatch loop.

use super::Emulator;
use crate::call::CallInfo;
use crate::error::{Fault, FaultReason};
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::state::{Emulation, ExecuteState, HaltReason, VmState};
use crate::trace::TraceStep;

use tracing::{debug, warn};

impl Emulator {
    /// Run the program against `callinfo`, starting from a fresh state that
    /// inherits `seed`'s storage.
    ///
    /// Faults end the path but never poison the emulator: the instruction
    /// sequence, SSA arena and recorded transfers stay valid for further
    /// runs or CFG construction.
    pub fn emulate(&mut self, callinfo: &CallInfo, seed: VmState) -> Emulation {
        let mut state = VmState::with_storage(seed.into_storage());
        let mut trace = Vec::new();

        let halt = loop {
            if trace.len() >= self.step_limit {
                break HaltReason::StepLimit;
            }

            let index = state.pc;
            let instr = match self.instructions.get(index) {
                Some(instr) => instr.clone(),
                None => break HaltReason::CodeEnd,
            };

            state.visit(instr.offset());
            state.pc += 1;
            state.gas = state.gas.saturating_sub(1);

            let result = self.execute(callinfo, &mut state, index, &instr);

            trace.push(TraceStep::new(
                trace.len(),
                instr.offset(),
                instr.opcode(),
                state.stack().to_vec(),
                state.storage().clone(),
            ));

            match result {
                Ok(ExecuteState::Proceed) => {}
                Ok(ExecuteState::Halt(reason)) => break reason,
                Err(reason) => {
                    let fault = Fault::new(instr.offset(), instr.opcode(), reason);
                    warn!("emulation path faulted: {}", fault);
                    break HaltReason::Fault(fault);
                }
            }
        };

        debug!("emulation halted after {} steps: {:?}", trace.len(), halt);

        Emulation::new(state, halt, trace)
    }

    fn execute(
        &mut self,
        callinfo: &CallInfo,
        state: &mut VmState,
        index: usize,
        instr: &Instruction,
    ) -> Result<ExecuteState, FaultReason> {
        debug!("{:#06x} {}", instr.offset(), instr);

        match instr.opcode() {
            Opcode::STOP => Ok(ExecuteState::Halt(HaltReason::Stop)),
            Opcode::JUMPDEST => Ok(ExecuteState::Proceed),
            Opcode::PUSH(_) => self.op_push(state, index, instr),
            Opcode::DUP(position) => self.op_dup(state, index, position),
            Opcode::SWAP(position) => self.op_swap(state, position),
            Opcode::SHA3 => self.op_sha3(state, index),
            Opcode::JUMP => self.op_jump(state, instr),
            Opcode::JUMPI => self.op_jumpi(state, instr),
            op if op.is_arithmetic() || op.is_comparison_logic() => self.op_alu(state, index, op),
            op if op.is_environmental() => self.op_environmental(callinfo, state, index, op),
            op if op.is_block_info() => self.op_block_info(state, index, op),
            op if op.is_stack_memory_storage_flow() => {
                self.op_stack_memory_storage(state, index, op)
            }
            op if op.is_log() => self.op_log(state, op),
            op if op.is_system() => self.op_system(state, index, op),
            _ => Ok(ExecuteState::Halt(HaltReason::InvalidInstruction)),
        }
    }

    /// Push the immediate's integer interpretation and a constant SSA node.
    fn op_push(
        &mut self,
        state: &mut VmState,
        index: usize,
        instr: &Instruction,
    ) -> Result<ExecuteState, FaultReason> {
        let value = match instr.operand() {
            Some(value) => value,
            None => return Ok(ExecuteState::Halt(HaltReason::InvalidInstruction)),
        };

        let id = self.ssa.constant(value);
        self.annotations[index] = Some(id);
        state.push(value, id)?;

        Ok(ExecuteState::Proceed)
    }

    /// Duplicate the `position`-th item from the top on both stacks. The
    /// duplicated slot reuses the source SSA node: the copy names the same
    /// value.
    fn op_dup(
        &mut self,
        state: &mut VmState,
        index: usize,
        position: u8,
    ) -> Result<ExecuteState, FaultReason> {
        let (value, ssa) = state.peek(position as usize)?;
        self.annotations[index] = Some(ssa);
        state.push(value, ssa)?;

        Ok(ExecuteState::Proceed)
    }

    /// Swap the top with the `(position + 1)`-th item on both stacks.
    fn op_swap(&mut self, state: &mut VmState, position: u8) -> Result<ExecuteState, FaultReason> {
        state.swap(position as usize)?;

        Ok(ExecuteState::Proceed)
    }
}
