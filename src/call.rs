//! Call context supplied to an emulation entry.

use primitive_types::U256;

/// The transaction-level inputs an emulation runs against.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallInfo {
    calldata: Vec<u8>,
    callvalue: U256,
}

impl CallInfo {
    pub const fn new(calldata: Vec<u8>, callvalue: U256) -> Self {
        Self {
            calldata,
            callvalue,
        }
    }

    pub fn calldata(&self) -> &[u8] {
        &self.calldata
    }

    pub const fn callvalue(&self) -> U256 {
        self.callvalue
    }

    /// Calldata length, as pushed by `CALLDATASIZE`.
    pub fn size(&self) -> U256 {
        U256::from(self.calldata.len())
    }

    /// Read the 32-byte big-endian word at `offset`, zero-filling past the
    /// end of calldata. Offsets beyond addressable range read as zero.
    pub fn load_word(&self, offset: U256) -> U256 {
        if offset > U256::from(usize::MAX as u64) {
            return U256::zero();
        }

        let offset = offset.low_u64() as usize;
        let mut word = [0u8; 32];
        for (i, byte) in word.iter_mut().enumerate() {
            *byte = offset
                .checked_add(i)
                .and_then(|p| self.calldata.get(p))
                .copied()
                .unwrap_or(0);
        }

        U256::from_big_endian(&word)
    }
}
