//! Byte-addressed VM memory.

use crate::consts::MEM_CHUNK_SIZE;

use primitive_types::U256;

use std::fmt;

/// Zero-initialized byte buffer growing on demand in 32-byte chunks.
///
/// The memory ceiling is enforced by the emulator before offsets reach this
/// type; the buffer itself is policy-free.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer length, in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Grow the buffer with zero-fill so it covers `end` bytes, rounded up
    /// to the chunk size.
    fn extend_to(&mut self, end: usize) {
        if self.bytes.len() < end {
            let chunks = (end + MEM_CHUNK_SIZE - 1) / MEM_CHUNK_SIZE;
            self.bytes.resize(chunks * MEM_CHUNK_SIZE, 0);
        }
    }

    /// Write a 32-byte big-endian word at `offset`.
    pub fn mstore(&mut self, offset: usize, value: U256) {
        self.extend_to(offset + 32);

        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        self.bytes[offset..offset + 32].copy_from_slice(&word);
    }

    /// Write the low 8 bits of `value` at `offset`.
    pub fn mstore8(&mut self, offset: usize, value: U256) {
        self.extend_to(offset + 1);
        self.bytes[offset] = value.byte(0);
    }

    /// Read a 32-byte big-endian word at `offset`, zero-filling past the
    /// current end.
    pub fn mload(&self, offset: usize) -> U256 {
        let mut word = [0u8; 32];
        for (i, byte) in word.iter_mut().enumerate() {
            *byte = self.bytes.get(offset + i).copied().unwrap_or(0);
        }

        U256::from_big_endian(&word)
    }

    /// Copy `len` bytes starting at `offset`, zero-filled past the end.
    pub fn read_range(&self, offset: usize, len: usize) -> Vec<u8> {
        (offset..offset + len)
            .map(|i| self.bytes.get(i).copied().unwrap_or(0))
            .collect()
    }

    /// Overwrite `data.len()` bytes starting at `offset`, extending first.
    pub fn write_range(&mut self, offset: usize, data: &[u8]) {
        self.extend_to(offset + data.len());
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.bytes))
    }
}
