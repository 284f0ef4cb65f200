//! EVM bytecode emulator and control-flow graph reconstructor.
//!
//! Given a hex-encoded program, the crate decodes it into an instruction
//! sequence and recovers basic blocks, function entry points and
//! inter-block edges. Indirect jump targets are resolved by a hybrid
//! interpreter that executes the program against a concrete machine state
//! while naming every produced stack slot with a static-single-assignment
//! record; a target pushed as an immediate (or computed from immediates)
//! reduces to a constant through its SSA expression.

pub mod call;
pub mod cfg;
pub mod consts;
pub mod crypto;
pub mod disassembler;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod opcode;
pub mod signatures;
pub mod ssa;
pub mod state;
pub mod storage;
pub mod trace;

pub mod prelude {
    pub use primitive_types::U256;

    pub use crate::call::CallInfo;
    pub use crate::cfg::{BasicBlock, Cfg, Edge, EdgeKind, Function};
    pub use crate::disassembler::Disassembler;
    pub use crate::error::{DisassemblyError, Fault, FaultReason};
    pub use crate::instruction::Instruction;
    pub use crate::interpreter::{ControlTransfer, Emulator};
    pub use crate::memory::Memory;
    pub use crate::opcode::Opcode;
    pub use crate::signatures::SignatureDb;
    pub use crate::ssa::{SsaArena, SsaId, SsaValue};
    pub use crate::state::{Emulation, ExecuteState, HaltReason, VmState};
    pub use crate::storage::Storage;
    pub use crate::trace::TraceStep;
}
