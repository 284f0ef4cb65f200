//! Linear bytecode decoder.

use crate::error::DisassemblyError;
use crate::instruction::Instruction;
use crate::opcode::Opcode;

use std::collections::HashMap;

/// Decodes a hex-encoded program into an instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembler {
    bytecode: Vec<u8>,
}

impl Disassembler {
    /// Parse hex text, tolerating a leading `0x` and surrounding
    /// whitespace. Odd length or non-hex characters are fatal.
    pub fn new(bytecode: &str) -> Result<Self, DisassemblyError> {
        let trimmed = bytecode.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        Ok(Self {
            bytecode: hex::decode(stripped)?,
        })
    }

    /// Wrap already-decoded bytes.
    pub fn from_bytes(bytecode: Vec<u8>) -> Self {
        Self { bytecode }
    }

    /// The raw program bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytecode
    }

    /// Decode the whole program, capturing PUSH immediates and their
    /// integer interpretation. A PUSH whose immediate runs past the end of
    /// the program is fatal.
    pub fn disassemble(&self) -> Result<Vec<Instruction>, DisassemblyError> {
        let mut instructions = Vec::new();
        let mut offset = 0;

        while offset < self.bytecode.len() {
            let opcode = Opcode::from_byte(self.bytecode[offset]);

            let instruction = match opcode {
                Opcode::PUSH(width) => {
                    let start = offset + 1;
                    let end = start + width as usize;
                    if end > self.bytecode.len() {
                        return Err(DisassemblyError::TruncatedPush { offset, width });
                    }

                    Instruction::with_immediate(offset, opcode, self.bytecode[start..end].to_vec())
                }
                _ => Instruction::new(offset, opcode),
            };

            offset = instruction.end_offset() + 1;
            instructions.push(instruction);
        }

        Ok(instructions)
    }
}

/// Side map from byte offset to position in the instruction sequence,
/// used to resolve jump targets.
pub fn offset_index(instructions: &[Instruction]) -> HashMap<usize, usize> {
    instructions
        .iter()
        .enumerate()
        .map(|(index, instruction)| (instruction.offset(), index))
        .collect()
}
