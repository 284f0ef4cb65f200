//! Hash primitives used by the emulator.

use primitive_types::U256;
use sha3::{Digest, Keccak256};

/// Keccak-256 digest of `data`, as a 256-bit word.
pub fn keccak256(data: &[u8]) -> U256 {
    U256::from_big_endian(Keccak256::digest(data).as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input() {
        // Well-known digest of the empty string.
        let expected = U256::from_str_radix(
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
            16,
        )
        .expect("valid hex");

        assert_eq!(keccak256(&[]), expected);
    }
}
