//! EVM opcode table.
//!
//! The table covers the pre-Constantinople instruction set; bytes that were
//! unassigned at that revision (shifts, `EXTCODEHASH`, `PUSH0`, ...) decode
//! as [`Opcode::INVALID`].

use std::fmt;

/// Opcode representation for the disassembler and the emulator.
///
/// Width-parameterized families carry their width: `PUSH(n)` for
/// `PUSH1..PUSH32`, `DUP(n)` for `DUP1..DUP16`, `SWAP(n)` for
/// `SWAP1..SWAP16` and `LOG(n)` for `LOG0..LOG4`.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Opcode {
    // 0x00s: stop and arithmetic
    STOP,
    ADD,
    MUL,
    SUB,
    DIV,
    SDIV,
    MOD,
    SMOD,
    ADDMOD,
    MULMOD,
    EXP,
    SIGNEXTEND,

    // 0x10s: comparison and bitwise logic
    LT,
    GT,
    SLT,
    SGT,
    EQ,
    ISZERO,
    AND,
    OR,
    XOR,
    NOT,
    BYTE,

    // 0x20s
    SHA3,

    // 0x30s: environmental information
    ADDRESS,
    BALANCE,
    ORIGIN,
    CALLER,
    CALLVALUE,
    CALLDATALOAD,
    CALLDATASIZE,
    CALLDATACOPY,
    CODESIZE,
    CODECOPY,
    GASPRICE,
    EXTCODESIZE,
    EXTCODECOPY,
    RETURNDATASIZE,
    RETURNDATACOPY,

    // 0x40s: block information
    BLOCKHASH,
    COINBASE,
    TIMESTAMP,
    NUMBER,
    DIFFICULTY,
    GASLIMIT,

    // 0x50s: stack, memory, storage and flow
    POP,
    MLOAD,
    MSTORE,
    MSTORE8,
    SLOAD,
    SSTORE,
    JUMP,
    JUMPI,
    PC,
    MSIZE,
    GAS,
    JUMPDEST,

    /// `PUSH1..PUSH32`; the payload is the immediate width in bytes.
    PUSH(u8),
    /// `DUP1..DUP16`; the payload is the duplicated stack position.
    DUP(u8),
    /// `SWAP1..SWAP16`; the payload is the swapped stack position.
    SWAP(u8),
    /// `LOG0..LOG4`; the payload is the topic count.
    LOG(u8),

    // 0xf0s: system
    CREATE,
    CALL,
    CALLCODE,
    RETURN,
    DELEGATECALL,
    STATICCALL,
    REVERT,
    INVALID,
    SELFDESTRUCT,
}

impl Opcode {
    /// Decode a raw byte. Unassigned bytes map to [`Opcode::INVALID`].
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::STOP,
            0x01 => Self::ADD,
            0x02 => Self::MUL,
            0x03 => Self::SUB,
            0x04 => Self::DIV,
            0x05 => Self::SDIV,
            0x06 => Self::MOD,
            0x07 => Self::SMOD,
            0x08 => Self::ADDMOD,
            0x09 => Self::MULMOD,
            0x0a => Self::EXP,
            0x0b => Self::SIGNEXTEND,
            0x10 => Self::LT,
            0x11 => Self::GT,
            0x12 => Self::SLT,
            0x13 => Self::SGT,
            0x14 => Self::EQ,
            0x15 => Self::ISZERO,
            0x16 => Self::AND,
            0x17 => Self::OR,
            0x18 => Self::XOR,
            0x19 => Self::NOT,
            0x1a => Self::BYTE,
            0x20 => Self::SHA3,
            0x30 => Self::ADDRESS,
            0x31 => Self::BALANCE,
            0x32 => Self::ORIGIN,
            0x33 => Self::CALLER,
            0x34 => Self::CALLVALUE,
            0x35 => Self::CALLDATALOAD,
            0x36 => Self::CALLDATASIZE,
            0x37 => Self::CALLDATACOPY,
            0x38 => Self::CODESIZE,
            0x39 => Self::CODECOPY,
            0x3a => Self::GASPRICE,
            0x3b => Self::EXTCODESIZE,
            0x3c => Self::EXTCODECOPY,
            0x3d => Self::RETURNDATASIZE,
            0x3e => Self::RETURNDATACOPY,
            0x40 => Self::BLOCKHASH,
            0x41 => Self::COINBASE,
            0x42 => Self::TIMESTAMP,
            0x43 => Self::NUMBER,
            0x44 => Self::DIFFICULTY,
            0x45 => Self::GASLIMIT,
            0x50 => Self::POP,
            0x51 => Self::MLOAD,
            0x52 => Self::MSTORE,
            0x53 => Self::MSTORE8,
            0x54 => Self::SLOAD,
            0x55 => Self::SSTORE,
            0x56 => Self::JUMP,
            0x57 => Self::JUMPI,
            0x58 => Self::PC,
            0x59 => Self::MSIZE,
            0x5a => Self::GAS,
            0x5b => Self::JUMPDEST,
            0x60..=0x7f => Self::PUSH(byte - 0x5f),
            0x80..=0x8f => Self::DUP(byte - 0x7f),
            0x90..=0x9f => Self::SWAP(byte - 0x8f),
            0xa0..=0xa4 => Self::LOG(byte - 0xa0),
            0xf0 => Self::CREATE,
            0xf1 => Self::CALL,
            0xf2 => Self::CALLCODE,
            0xf3 => Self::RETURN,
            0xf4 => Self::DELEGATECALL,
            0xfa => Self::STATICCALL,
            0xfd => Self::REVERT,
            0xff => Self::SELFDESTRUCT,
            _ => Self::INVALID,
        }
    }

    /// Number of stack items the opcode consumes.
    pub const fn pops(&self) -> usize {
        match self {
            Self::STOP
            | Self::ADDRESS
            | Self::ORIGIN
            | Self::CALLER
            | Self::CALLVALUE
            | Self::CALLDATASIZE
            | Self::CODESIZE
            | Self::GASPRICE
            | Self::RETURNDATASIZE
            | Self::COINBASE
            | Self::TIMESTAMP
            | Self::NUMBER
            | Self::DIFFICULTY
            | Self::GASLIMIT
            | Self::PC
            | Self::MSIZE
            | Self::GAS
            | Self::JUMPDEST
            | Self::PUSH(_)
            | Self::INVALID => 0,

            Self::ISZERO
            | Self::NOT
            | Self::BALANCE
            | Self::CALLDATALOAD
            | Self::EXTCODESIZE
            | Self::BLOCKHASH
            | Self::POP
            | Self::MLOAD
            | Self::SLOAD
            | Self::JUMP
            | Self::SELFDESTRUCT => 1,

            Self::ADD
            | Self::MUL
            | Self::SUB
            | Self::DIV
            | Self::SDIV
            | Self::MOD
            | Self::SMOD
            | Self::EXP
            | Self::SIGNEXTEND
            | Self::LT
            | Self::GT
            | Self::SLT
            | Self::SGT
            | Self::EQ
            | Self::AND
            | Self::OR
            | Self::XOR
            | Self::BYTE
            | Self::SHA3
            | Self::MSTORE
            | Self::MSTORE8
            | Self::SSTORE
            | Self::JUMPI
            | Self::RETURN
            | Self::REVERT => 2,

            Self::ADDMOD
            | Self::MULMOD
            | Self::CALLDATACOPY
            | Self::CODECOPY
            | Self::RETURNDATACOPY
            | Self::CREATE => 3,

            Self::EXTCODECOPY => 4,

            Self::DELEGATECALL | Self::STATICCALL => 6,
            Self::CALL | Self::CALLCODE => 7,

            Self::DUP(n) => *n as usize,
            Self::SWAP(n) => *n as usize + 1,
            Self::LOG(n) => *n as usize + 2,
        }
    }

    /// Number of stack items the opcode produces.
    pub const fn pushes(&self) -> usize {
        match self {
            Self::STOP
            | Self::CALLDATACOPY
            | Self::CODECOPY
            | Self::RETURNDATACOPY
            | Self::EXTCODECOPY
            | Self::POP
            | Self::MSTORE
            | Self::MSTORE8
            | Self::SSTORE
            | Self::JUMP
            | Self::JUMPI
            | Self::JUMPDEST
            | Self::LOG(_)
            | Self::RETURN
            | Self::REVERT
            | Self::INVALID
            | Self::SELFDESTRUCT => 0,

            Self::DUP(n) => *n as usize + 1,
            Self::SWAP(n) => *n as usize + 1,

            _ => 1,
        }
    }

    /// Immediate bytes following the opcode; non-zero only for PUSH.
    pub const fn immediate_len(&self) -> usize {
        match self {
            Self::PUSH(n) => *n as usize,
            _ => 0,
        }
    }

    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::ADD
                | Self::MUL
                | Self::SUB
                | Self::DIV
                | Self::SDIV
                | Self::MOD
                | Self::SMOD
                | Self::ADDMOD
                | Self::MULMOD
                | Self::EXP
                | Self::SIGNEXTEND
        )
    }

    pub const fn is_comparison_logic(&self) -> bool {
        matches!(
            self,
            Self::LT
                | Self::GT
                | Self::SLT
                | Self::SGT
                | Self::EQ
                | Self::ISZERO
                | Self::AND
                | Self::OR
                | Self::XOR
                | Self::NOT
                | Self::BYTE
        )
    }

    pub const fn is_sha3(&self) -> bool {
        matches!(self, Self::SHA3)
    }

    pub const fn is_environmental(&self) -> bool {
        matches!(
            self,
            Self::ADDRESS
                | Self::BALANCE
                | Self::ORIGIN
                | Self::CALLER
                | Self::CALLVALUE
                | Self::CALLDATALOAD
                | Self::CALLDATASIZE
                | Self::CALLDATACOPY
                | Self::CODESIZE
                | Self::CODECOPY
                | Self::GASPRICE
                | Self::EXTCODESIZE
                | Self::EXTCODECOPY
                | Self::RETURNDATASIZE
                | Self::RETURNDATACOPY
        )
    }

    pub const fn is_block_info(&self) -> bool {
        matches!(
            self,
            Self::BLOCKHASH
                | Self::COINBASE
                | Self::TIMESTAMP
                | Self::NUMBER
                | Self::DIFFICULTY
                | Self::GASLIMIT
        )
    }

    pub const fn is_stack_memory_storage_flow(&self) -> bool {
        matches!(
            self,
            Self::POP
                | Self::MLOAD
                | Self::MSTORE
                | Self::MSTORE8
                | Self::SLOAD
                | Self::SSTORE
                | Self::JUMP
                | Self::JUMPI
                | Self::PC
                | Self::MSIZE
                | Self::GAS
                | Self::JUMPDEST
        )
    }

    pub const fn is_push(&self) -> bool {
        matches!(self, Self::PUSH(_))
    }

    pub const fn is_dup(&self) -> bool {
        matches!(self, Self::DUP(_))
    }

    pub const fn is_swap(&self) -> bool {
        matches!(self, Self::SWAP(_))
    }

    pub const fn is_log(&self) -> bool {
        matches!(self, Self::LOG(_))
    }

    pub const fn is_system(&self) -> bool {
        matches!(
            self,
            Self::CREATE
                | Self::CALL
                | Self::CALLCODE
                | Self::RETURN
                | Self::DELEGATECALL
                | Self::STATICCALL
                | Self::REVERT
                | Self::INVALID
                | Self::SELFDESTRUCT
        )
    }

    /// Opcodes that end the execution of the current path.
    pub const fn is_halt(&self) -> bool {
        matches!(
            self,
            Self::STOP | Self::RETURN | Self::REVERT | Self::INVALID | Self::SELFDESTRUCT
        )
    }

    pub const fn is_branch_unconditional(&self) -> bool {
        matches!(self, Self::JUMP)
    }

    pub const fn is_branch_conditional(&self) -> bool {
        matches!(self, Self::JUMPI)
    }

    /// Opcodes whose result depends only on their stack inputs. Only these
    /// may appear inside an SSA subtree that reduces to a constant.
    pub const fn is_pure(&self) -> bool {
        self.is_arithmetic() || self.is_comparison_logic()
    }

    /// Whether the opcode terminates a basic block on its own.
    pub const fn is_block_terminator(&self) -> bool {
        self.is_branch_unconditional() || self.is_branch_conditional() || self.is_halt()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PUSH(n) => write!(f, "PUSH{n}"),
            Self::DUP(n) => write!(f, "DUP{n}"),
            Self::SWAP(n) => write!(f, "SWAP{n}"),
            Self::LOG(n) => write!(f, "LOG{n}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_ranges_decode_width_families() {
        assert_eq!(Opcode::from_byte(0x60), Opcode::PUSH(1));
        assert_eq!(Opcode::from_byte(0x7f), Opcode::PUSH(32));
        assert_eq!(Opcode::from_byte(0x80), Opcode::DUP(1));
        assert_eq!(Opcode::from_byte(0x8f), Opcode::DUP(16));
        assert_eq!(Opcode::from_byte(0x90), Opcode::SWAP(1));
        assert_eq!(Opcode::from_byte(0x9f), Opcode::SWAP(16));
        assert_eq!(Opcode::from_byte(0xa0), Opcode::LOG(0));
        assert_eq!(Opcode::from_byte(0xa4), Opcode::LOG(4));
    }

    #[test]
    fn unassigned_bytes_are_invalid() {
        // Post-Constantinople additions are outside the supported table.
        for byte in [0x0c, 0x1b, 0x1c, 0x1d, 0x3f, 0x5c, 0x5e, 0x5f, 0xa5, 0xef] {
            assert_eq!(Opcode::from_byte(byte), Opcode::INVALID, "byte {byte:#x}");
        }
    }

    #[test]
    fn arity_spot_checks() {
        assert_eq!(Opcode::ADD.pops(), 2);
        assert_eq!(Opcode::ADD.pushes(), 1);
        assert_eq!(Opcode::ADDMOD.pops(), 3);
        assert_eq!(Opcode::CALL.pops(), 7);
        assert_eq!(Opcode::DUP(3).pops(), 3);
        assert_eq!(Opcode::DUP(3).pushes(), 4);
        assert_eq!(Opcode::SWAP(1).pops(), 2);
        assert_eq!(Opcode::LOG(4).pops(), 6);
        assert_eq!(Opcode::PUSH(32).immediate_len(), 32);
        assert_eq!(Opcode::MSTORE.immediate_len(), 0);
    }

    #[test]
    fn display_expands_width_families() {
        assert_eq!(Opcode::PUSH(4).to_string(), "PUSH4");
        assert_eq!(Opcode::SWAP(16).to_string(), "SWAP16");
        assert_eq!(Opcode::SELFDESTRUCT.to_string(), "SELFDESTRUCT");
    }
}
