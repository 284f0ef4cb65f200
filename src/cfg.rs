//! Control-flow graph reconstruction.
//!
//! Basic blocks and function entry points come from a static pass over the
//! instruction sequence; branch edges come from emulation, where indirect
//! targets have been resolved through their SSA expressions.

use crate::call::CallInfo;
use crate::disassembler::Disassembler;
use crate::error::DisassemblyError;
use crate::instruction::Instruction;
use crate::interpreter::Emulator;
use crate::opcode::Opcode;
use crate::signatures::SignatureDb;
use crate::state::VmState;

use itertools::Itertools;

use std::collections::HashSet;
use std::fmt;

/// Classification of a CFG edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "kebab-case")]
pub enum EdgeKind {
    /// Execution runs off the end of a block into its successor.
    Fallthrough,
    /// Taken branch of a `JUMPI`.
    ConditionalTrue,
    /// Untaken branch of a `JUMPI`.
    ConditionalFalse,
    /// A `JUMP`.
    Unconditional,
    /// Return to a call site. Reserved; calls do not split blocks in this
    /// model, so no current pass emits it.
    CallReturn,
}

/// A directed edge between two basic blocks, identified by start offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    from: usize,
    to: usize,
    kind: EdgeKind,
}

impl Edge {
    pub const fn new(from: usize, to: usize, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }

    /// Start offset of the source block.
    pub const fn from(&self) -> usize {
        self.from
    }

    /// Start offset of the target block.
    pub const fn to(&self) -> usize {
        self.to
    }

    pub const fn kind(&self) -> EdgeKind {
        self.kind
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block_{:x} -> block_{:x} [{}]",
            self.from, self.to, self.kind
        )
    }
}

/// A maximal straight-line run of instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct BasicBlock {
    start_offset: usize,
    end_offset: usize,
    instructions: Vec<Instruction>,
}

impl BasicBlock {
    fn from_instructions(instructions: Vec<Instruction>) -> Self {
        debug_assert!(!instructions.is_empty());

        Self {
            start_offset: instructions[0].offset(),
            end_offset: instructions[instructions.len() - 1].end_offset(),
            instructions,
        }
    }

    /// Byte offset of the first instruction.
    pub const fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Byte offset of the last byte of the last instruction.
    pub const fn end_offset(&self) -> usize {
        self.end_offset
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn first(&self) -> &Instruction {
        &self.instructions[0]
    }

    pub fn last(&self) -> &Instruction {
        &self.instructions[self.instructions.len() - 1]
    }

    /// Block label, e.g. `block_1f`.
    pub fn name(&self) -> String {
        format!("block_{:x}", self.start_offset)
    }
}

/// A discovered function entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    start_offset: usize,
    selector: Option<u32>,
    name: String,
    preferred_name: Option<String>,
}

impl Function {
    /// The prologue at offset zero that routes incoming selectors.
    pub fn dispatcher(start_offset: usize) -> Self {
        Self {
            start_offset,
            selector: None,
            name: "Dispatcher".into(),
            preferred_name: None,
        }
    }

    /// A function reached through the dispatcher with `selector`.
    pub fn with_selector(
        start_offset: usize,
        selector: u32,
        preferred_name: Option<String>,
    ) -> Self {
        Self {
            start_offset,
            selector: Some(selector),
            name: format!("func_{selector:x}"),
            preferred_name,
        }
    }

    /// Entry byte offset.
    pub const fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// The dispatcher selector, when the function was discovered through
    /// a selector comparison.
    pub const fn selector(&self) -> Option<u32> {
        self.selector
    }

    /// Synthetic name, e.g. `func_aabbccdd`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name from the signature database, if known.
    pub fn preferred_name(&self) -> Option<&str> {
        self.preferred_name.as_deref()
    }

    /// The preferred name when known, the synthetic one otherwise.
    pub fn display_name(&self) -> &str {
        self.preferred_name().unwrap_or(&self.name)
    }
}

/// Partition the instruction sequence into basic blocks.
///
/// A block ends at a branch, a halt, an instruction immediately preceding
/// a `JUMPDEST`, or the end of the sequence. The blocks cover the sequence
/// exactly, pairwise disjoint.
pub fn enumerate_blocks(instructions: &[Instruction]) -> Vec<BasicBlock> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for (index, instruction) in instructions.iter().enumerate() {
        current.push(instruction.clone());

        let splits_before_jumpdest = instructions
            .get(index + 1)
            .map(|next| next.opcode() == Opcode::JUMPDEST)
            .unwrap_or(false);

        if instruction.opcode().is_block_terminator()
            || splits_before_jumpdest
            || index + 1 == instructions.len()
        {
            blocks.push(BasicBlock::from_instructions(std::mem::take(&mut current)));
        }
    }

    blocks
}

/// Scan for the dispatcher pattern `PUSH4 S · EQ · PUSH1|PUSH2 X · JUMPI`
/// and declare a function per match. The instruction at offset zero seeds
/// the `Dispatcher` entry; matches whose entry offset does not decode to
/// an instruction are ignored.
pub fn enumerate_functions(
    instructions: &[Instruction],
    signatures: &SignatureDb,
) -> Vec<Function> {
    let mut functions = Vec::new();

    let first = match instructions.first() {
        Some(first) => first,
        None => return functions,
    };
    functions.push(Function::dispatcher(first.offset()));

    let offsets: HashSet<usize> = instructions.iter().map(Instruction::offset).collect();

    for (push4, eq, push, jumpi) in instructions.iter().tuple_windows() {
        let matches_pattern = push4.opcode() == Opcode::PUSH(4)
            && eq.opcode() == Opcode::EQ
            && matches!(push.opcode(), Opcode::PUSH(1) | Opcode::PUSH(2))
            && jumpi.opcode() == Opcode::JUMPI;
        if !matches_pattern {
            continue;
        }

        let (selector, entry) = match (push4.operand(), push.operand()) {
            (Some(selector), Some(entry)) => (selector.low_u32(), entry.low_u64() as usize),
            _ => continue,
        };

        if !offsets.contains(&entry) {
            continue;
        }

        let preferred = signatures.lookup(selector).map(str::to_owned);
        functions.push(Function::with_selector(entry, selector, preferred));
    }

    functions
}

fn fallthrough_edges(blocks: &[BasicBlock]) -> Vec<Edge> {
    blocks
        .iter()
        .tuple_windows()
        .filter(|(block, _)| !block.last().opcode().is_block_terminator())
        .map(|(block, next)| Edge::new(block.start_offset(), next.start_offset(), EdgeKind::Fallthrough))
        .collect()
}

fn block_containing(blocks: &[BasicBlock], offset: usize) -> Option<&BasicBlock> {
    blocks
        .iter()
        .find(|block| block.start_offset() <= offset && offset <= block.end_offset())
}

fn block_starting(blocks: &[BasicBlock], offset: usize) -> Option<&BasicBlock> {
    blocks.iter().find(|block| block.start_offset() == offset)
}

/// A reconstructed control-flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Cfg {
    instructions: Vec<Instruction>,
    blocks: Vec<BasicBlock>,
    functions: Vec<Function>,
    edges: Vec<Edge>,
}

impl Cfg {
    /// Reconstruct from the static passes alone: blocks, dispatcher
    /// functions, and plain fallthrough edges. Branch targets stay
    /// unresolved.
    pub fn from_static(bytecode: &str, signatures: &SignatureDb) -> Result<Self, DisassemblyError> {
        let instructions = Disassembler::new(bytecode)?.disassemble()?;
        let functions = enumerate_functions(&instructions, signatures);
        let blocks = enumerate_blocks(&instructions);
        let edges = fallthrough_edges(&blocks);

        Ok(Self {
            instructions,
            blocks,
            functions,
            edges,
        })
    }

    /// Build the graph from an emulator after one or more runs, attaching
    /// the control transfers it observed to the statically enumerated
    /// blocks.
    pub fn from_emulator(emulator: &Emulator, signatures: &SignatureDb) -> Self {
        let instructions = emulator.instructions().to_vec();
        let functions = enumerate_functions(&instructions, signatures);
        let blocks = enumerate_blocks(&instructions);

        let mut edges = fallthrough_edges(&blocks);
        for transfer in emulator.transfers() {
            let from = match block_containing(&blocks, transfer.from()) {
                Some(block) => block.start_offset(),
                None => continue,
            };
            let to = match block_starting(&blocks, transfer.to()) {
                Some(block) => block.start_offset(),
                None => continue,
            };

            edges.push(Edge::new(from, to, transfer.kind()));
        }
        let edges = edges.into_iter().unique().collect();

        Self {
            instructions,
            blocks,
            functions,
            edges,
        }
    }

    /// Disassemble, run one emulation against `callinfo`, and build the
    /// graph from what it visited.
    pub fn from_emulation(
        bytecode: &str,
        callinfo: &CallInfo,
        signatures: &SignatureDb,
    ) -> Result<Self, DisassemblyError> {
        let mut emulator = Emulator::new(bytecode)?;
        emulator.emulate(callinfo, VmState::new());

        Ok(Self::from_emulator(&emulator, signatures))
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The block containing byte `offset`, if any.
    pub fn block_at(&self, offset: usize) -> Option<&BasicBlock> {
        block_containing(&self.blocks, offset)
    }
}
