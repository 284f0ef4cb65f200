//! [`Emulator`] implementation.
//!
//! The emulator walks the decoded instruction sequence against a concrete
//! machine state while naming every produced stack slot with an SSA node,
//! so indirect jump targets can be recovered by reducing their expression.

use crate::consts::{DEFAULT_MAX_DEPTH, DEFAULT_STEP_LIMIT, ENV_SENTINEL};
use crate::disassembler::{self, Disassembler};
use crate::error::DisassemblyError;
use crate::instruction::Instruction;
use crate::ssa::{SsaArena, SsaId};

use primitive_types::U256;

use std::collections::HashMap;

pub mod alu;

mod blockchain;
mod executors;
mod flow;
mod memory;
mod system;

pub use flow::ControlTransfer;

/// Hybrid concrete/SSA emulator over one disassembled program.
///
/// The instruction sequence is immutable after construction. SSA
/// annotations, the value arena and recorded control transfers accumulate
/// across [`Emulator::emulate`] runs; each run owns its
/// [`crate::state::VmState`] exclusively.
#[derive(Debug, Clone)]
pub struct Emulator {
    instructions: Vec<Instruction>,
    offset_index: HashMap<usize, usize>,
    code: Vec<u8>,
    ssa: SsaArena,
    annotations: Vec<Option<SsaId>>,
    transfers: Vec<ControlTransfer>,
    max_depth: usize,
    step_limit: usize,
}

impl Emulator {
    /// Disassemble `bytecode` and prepare an emulator over it.
    pub fn new(bytecode: &str) -> Result<Self, DisassemblyError> {
        let disasm = Disassembler::new(bytecode)?;
        let instructions = disasm.disassemble()?;
        let offset_index = disassembler::offset_index(&instructions);
        let annotations = vec![None; instructions.len()];

        Ok(Self {
            instructions,
            offset_index,
            code: disasm.into_bytes(),
            ssa: SsaArena::new(),
            annotations,
            transfers: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            step_limit: DEFAULT_STEP_LIMIT,
        })
    }

    /// Override the advisory depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Override the per-run instruction ceiling.
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// The decoded instruction sequence, in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The raw program bytes.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// The SSA value arena accumulated so far.
    pub const fn ssa(&self) -> &SsaArena {
        &self.ssa
    }

    /// SSA node last produced by the instruction at `index`, if any. The
    /// slot is overwritten on revisit; the last execution wins.
    pub fn annotation(&self, index: usize) -> Option<SsaId> {
        self.annotations.get(index).copied().flatten()
    }

    /// Control transfers observed during emulation, in execution order.
    pub fn transfers(&self) -> &[ControlTransfer] {
        &self.transfers
    }

    /// Advisory cap on nested emulation paths.
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The instruction starting at byte `offset`, if any.
    pub fn instruction_at(&self, offset: usize) -> Option<&Instruction> {
        self.offset_index
            .get(&offset)
            .and_then(|index| self.instructions.get(*index))
    }

}

/// The placeholder for environmental queries the emulator does not model.
pub(crate) fn sentinel() -> U256 {
    U256::from(ENV_SENTINEL)
}
