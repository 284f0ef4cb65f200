//! Decoded instruction representation.

use crate::opcode::Opcode;

use primitive_types::U256;

use std::fmt;

/// One decoded instruction.
///
/// Immutable after disassembly; the emulator keeps its SSA annotations in a
/// side table so the sequence can be shared between analyses.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    offset: usize,
    opcode: Opcode,
    immediate: Option<Vec<u8>>,
    operand: Option<U256>,
}

impl Instruction {
    /// Create an instruction without an immediate.
    pub const fn new(offset: usize, opcode: Opcode) -> Self {
        Self {
            offset,
            opcode,
            immediate: None,
            operand: None,
        }
    }

    /// Create a PUSH instruction carrying its immediate bytes. The integer
    /// interpretation is computed here, during disassembly.
    pub fn with_immediate(offset: usize, opcode: Opcode, immediate: Vec<u8>) -> Self {
        let operand = U256::from_big_endian(&immediate);

        Self {
            offset,
            opcode,
            immediate: Some(immediate),
            operand: Some(operand),
        }
    }

    /// Byte offset of the opcode.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Byte offset of the last byte of the instruction, immediate included.
    pub const fn end_offset(&self) -> usize {
        self.offset + self.opcode.immediate_len()
    }

    /// Encoded size in bytes.
    pub const fn size(&self) -> usize {
        1 + self.opcode.immediate_len()
    }

    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Raw immediate bytes, for PUSH instructions.
    pub fn immediate(&self) -> Option<&[u8]> {
        self.immediate.as_deref()
    }

    /// Integer interpretation of the immediate, for PUSH instructions.
    pub const fn operand(&self) -> Option<U256> {
        self.operand
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(operand) => write!(f, "{} {:#x}", self.opcode, operand),
            None => write!(f, "{}", self.opcode),
        }
    }
}
