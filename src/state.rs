//! Runtime state representation for the emulator.

use crate::consts::{INITIAL_GAS, VM_MAX_STACK_DEPTH};
use crate::error::{Fault, StackError};
use crate::memory::Memory;
use crate::ssa::SsaId;
use crate::storage::Storage;
use crate::trace::TraceStep;

use primitive_types::U256;

/// Machine state owned by a single emulation.
///
/// The concrete stack and the SSA stack move in lock-step: every completed
/// instruction leaves them at the same depth, with the SSA slot at each
/// position naming the concrete value at the same position.
#[derive(Debug, Clone)]
pub struct VmState {
    pub(crate) pc: usize,
    stack: Vec<U256>,
    ssa_stack: Vec<SsaId>,
    pub(crate) memory: Memory,
    pub(crate) storage: Storage,
    pub(crate) last_returned: Vec<u8>,
    pub(crate) gas: u64,
    instructions_visited: Vec<usize>,
}

impl Default for VmState {
    fn default() -> Self {
        Self::new()
    }
}

impl VmState {
    pub fn new() -> Self {
        Self {
            pc: 0,
            stack: Vec::new(),
            ssa_stack: Vec::new(),
            memory: Memory::new(),
            storage: Storage::new(),
            last_returned: Vec::new(),
            gas: INITIAL_GAS,
            instructions_visited: Vec::new(),
        }
    }

    /// Fresh state inheriting `storage`, the way a later call observes the
    /// effects of an earlier one on the same contract instance.
    pub fn with_storage(storage: Storage) -> Self {
        Self {
            storage,
            ..Self::new()
        }
    }

    /// Index of the next instruction in the decoded sequence.
    pub const fn pc(&self) -> usize {
        self.pc
    }

    /// The concrete stack, bottom first.
    pub fn stack(&self) -> &[U256] {
        &self.stack
    }

    /// The SSA stack, bottom first; same depth and order as [`Self::stack`].
    pub fn ssa_stack(&self) -> &[SsaId] {
        &self.ssa_stack
    }

    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Take the storage out of a finished state, to seed the next run.
    pub fn into_storage(self) -> Storage {
        self.storage
    }

    /// Bytes handed back by the most recent `RETURN`/`REVERT`.
    pub fn last_returned(&self) -> &[u8] {
        &self.last_returned
    }

    /// Remaining gas. Informational; only a unit charge per instruction is
    /// applied.
    pub const fn gas(&self) -> u64 {
        self.gas
    }

    /// Byte offsets of executed instructions, in first-visit order.
    pub fn instructions_visited(&self) -> &[usize] {
        &self.instructions_visited
    }

    pub(crate) fn visit(&mut self, offset: usize) {
        if !self.instructions_visited.contains(&offset) {
            self.instructions_visited.push(offset);
        }
    }

    /// Push onto both stacks.
    pub(crate) fn push(&mut self, value: U256, ssa: SsaId) -> Result<(), StackError> {
        if self.stack.len() == VM_MAX_STACK_DEPTH {
            return Err(StackError::Overflow);
        }

        self.stack.push(value);
        self.ssa_stack.push(ssa);

        Ok(())
    }

    /// Pop from both stacks. Fails without mutating either stack.
    pub(crate) fn pop(&mut self) -> Result<(U256, SsaId), StackError> {
        if self.stack.is_empty() {
            return Err(StackError::Underflow);
        }

        // Lock-step discipline guarantees both pops succeed together.
        match (self.stack.pop(), self.ssa_stack.pop()) {
            (Some(value), Some(ssa)) => Ok((value, ssa)),
            _ => Err(StackError::Underflow),
        }
    }

    /// Pop `n` items from both stacks, top first. Fails without mutating
    /// either stack when fewer than `n` items are available.
    pub(crate) fn pop_n(&mut self, n: usize) -> Result<Vec<(U256, SsaId)>, StackError> {
        if self.stack.len() < n {
            return Err(StackError::Underflow);
        }

        let mut items = Vec::with_capacity(n);
        for _ in 0..n {
            items.push(self.pop()?);
        }

        Ok(items)
    }

    /// The `position`-th item from the top of both stacks (1-based).
    pub(crate) fn peek(&self, position: usize) -> Result<(U256, SsaId), StackError> {
        if position == 0 || self.stack.len() < position {
            return Err(StackError::Underflow);
        }

        let index = self.stack.len() - position;
        Ok((self.stack[index], self.ssa_stack[index]))
    }

    /// Swap the top of both stacks with the `(position + 1)`-th item.
    pub(crate) fn swap(&mut self, position: usize) -> Result<(), StackError> {
        if self.stack.len() < position + 1 {
            return Err(StackError::Underflow);
        }

        let top = self.stack.len() - 1;
        let other = top - position;
        self.stack.swap(top, other);
        self.ssa_stack.swap(top, other);

        Ok(())
    }
}

/// Resulting state of a single instruction execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteState {
    /// The emulation should proceed normally.
    Proceed,
    /// The current path ended.
    Halt(HaltReason),
}

/// Why an emulation path stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// `STOP` was executed.
    Stop,
    /// `RETURN` was executed.
    Return,
    /// `REVERT` was executed.
    Revert,
    /// `SELFDESTRUCT` was executed.
    SelfDestruct,
    /// An `INVALID` (or undecodable) instruction was reached.
    InvalidInstruction,
    /// The program counter ran off the end of the instruction sequence.
    CodeEnd,
    /// The per-run instruction ceiling was reached.
    StepLimit,
    /// The path faulted; the emulator and instruction sequence stay usable.
    Fault(Fault),
}

impl HaltReason {
    /// Whether the path ended through normal program behavior rather than
    /// a fault.
    pub const fn is_natural(&self) -> bool {
        !matches!(self, Self::Fault(_))
    }

    /// The fault that ended the path, if any.
    pub const fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Outcome of one emulation run: the final state, why it stopped, and the
/// per-step trace.
#[derive(Debug, Clone)]
pub struct Emulation {
    state: VmState,
    halt: HaltReason,
    trace: Vec<TraceStep>,
}

impl Emulation {
    pub(crate) fn new(state: VmState, halt: HaltReason, trace: Vec<TraceStep>) -> Self {
        Self { state, halt, trace }
    }

    pub const fn state(&self) -> &VmState {
        &self.state
    }

    pub const fn halt(&self) -> &HaltReason {
        &self.halt
    }

    pub fn trace(&self) -> &[TraceStep] {
        &self.trace
    }

    /// Split into the final state and halt reason, discarding the trace.
    pub fn into_inner(self) -> (VmState, HaltReason) {
        (self.state, self.halt)
    }

    /// The final state, for seeding a follow-up run.
    pub fn into_state(self) -> VmState {
        self.state
    }
}
