//! 256-bit arithmetic, comparison and bitwise semantics.
//!
//! All operations are modulo 2^256. Signed variants reinterpret their
//! operands as two's-complement words. [`apply`] dispatches a pure opcode
//! over operands in pop order (top of stack first) and is shared between
//! the emulator and the SSA expression evaluator.

use super::Emulator;
use crate::error::FaultReason;
use crate::opcode::Opcode;
use crate::ssa::SsaId;
use crate::state::{ExecuteState, HaltReason, VmState};

use primitive_types::{U256, U512};

const SIGN_BIT: usize = 255;

fn word(condition: bool) -> U256 {
    if condition {
        U256::one()
    } else {
        U256::zero()
    }
}

fn is_negative(x: &U256) -> bool {
    x.bit(SIGN_BIT)
}

fn twos_complement(x: U256) -> U256 {
    (!x).overflowing_add(U256::one()).0
}

fn abs(x: U256) -> U256 {
    if is_negative(&x) {
        twos_complement(x)
    } else {
        x
    }
}

pub fn add(a: U256, b: U256) -> U256 {
    a.overflowing_add(b).0
}

pub fn sub(a: U256, b: U256) -> U256 {
    a.overflowing_sub(b).0
}

pub fn mul(a: U256, b: U256) -> U256 {
    a.overflowing_mul(b).0
}

/// Truncating division; division by zero yields zero.
pub fn div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a / b
    }
}

/// Modulus; a zero modulus yields zero.
pub fn rem(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a % b
    }
}

/// Two's-complement division. `-2^255 / -1` wraps back to `-2^255`.
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }

    let negative = is_negative(&a) != is_negative(&b);
    let quotient = abs(a) / abs(b);

    if negative {
        twos_complement(quotient)
    } else {
        quotient
    }
}

/// Two's-complement modulus; the sign follows the dividend.
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }

    let remainder = abs(a) % abs(b);

    if is_negative(&a) {
        twos_complement(remainder)
    } else {
        remainder
    }
}

/// Full-width `(a + b) % m`; a zero modulus yields zero.
pub fn addmod(a: U256, b: U256, m: U256) -> U256 {
    if m.is_zero() {
        return U256::zero();
    }

    let sum = U512::from(a) + U512::from(b);
    U256::try_from(sum % U512::from(m)).expect("remainder fits the word")
}

/// Full-width `(a * b) % m`; a zero modulus yields zero.
pub fn mulmod(a: U256, b: U256, m: U256) -> U256 {
    if m.is_zero() {
        return U256::zero();
    }

    U256::try_from(a.full_mul(b) % U512::from(m)).expect("remainder fits the word")
}

/// Exponentiation modulo 2^256.
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Sign-extend the byte at position `k` (0 = least significant). `k >= 31`
/// returns `x` unchanged.
pub fn signextend(k: U256, x: U256) -> U256 {
    if k >= U256::from(31) {
        return x;
    }

    let bit = 8 * k.low_u64() as usize + 7;
    let mask = (U256::one() << (bit + 1)) - 1;

    if x.bit(bit) {
        x | !mask
    } else {
        x & mask
    }
}

pub fn lt(a: U256, b: U256) -> U256 {
    word(a < b)
}

pub fn gt(a: U256, b: U256) -> U256 {
    word(a > b)
}

/// Two's-complement less-than.
pub fn slt(a: U256, b: U256) -> U256 {
    word(match (is_negative(&a), is_negative(&b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    })
}

/// Two's-complement greater-than.
pub fn sgt(a: U256, b: U256) -> U256 {
    slt(b, a)
}

pub fn eq(a: U256, b: U256) -> U256 {
    word(a == b)
}

pub fn iszero(a: U256) -> U256 {
    word(a.is_zero())
}

/// The `n`-th most significant byte of `x`; zero for `n >= 32`.
pub fn byte(n: U256, x: U256) -> U256 {
    if n >= U256::from(32) {
        return U256::zero();
    }

    // U256::byte indexes from the least significant end.
    U256::from(x.byte(31 - n.low_u64() as usize))
}

/// Apply a pure opcode to operands in pop order. `None` when the opcode is
/// not pure or the operand count does not match its arity.
pub fn apply(op: &Opcode, args: &[U256]) -> Option<U256> {
    let value = match (op, args) {
        (Opcode::ADD, &[a, b]) => add(a, b),
        (Opcode::SUB, &[a, b]) => sub(a, b),
        (Opcode::MUL, &[a, b]) => mul(a, b),
        (Opcode::DIV, &[a, b]) => div(a, b),
        (Opcode::SDIV, &[a, b]) => sdiv(a, b),
        (Opcode::MOD, &[a, b]) => rem(a, b),
        (Opcode::SMOD, &[a, b]) => smod(a, b),
        (Opcode::ADDMOD, &[a, b, m]) => addmod(a, b, m),
        (Opcode::MULMOD, &[a, b, m]) => mulmod(a, b, m),
        (Opcode::EXP, &[a, b]) => exp(a, b),
        (Opcode::SIGNEXTEND, &[k, x]) => signextend(k, x),
        (Opcode::LT, &[a, b]) => lt(a, b),
        (Opcode::GT, &[a, b]) => gt(a, b),
        (Opcode::SLT, &[a, b]) => slt(a, b),
        (Opcode::SGT, &[a, b]) => sgt(a, b),
        (Opcode::EQ, &[a, b]) => eq(a, b),
        (Opcode::ISZERO, &[a]) => iszero(a),
        (Opcode::AND, &[a, b]) => a & b,
        (Opcode::OR, &[a, b]) => a | b,
        (Opcode::XOR, &[a, b]) => a ^ b,
        (Opcode::NOT, &[a]) => !a,
        (Opcode::BYTE, &[n, x]) => byte(n, x),
        _ => return None,
    };

    Some(value)
}

impl Emulator {
    /// Arithmetic, comparison and bitwise opcodes: pop the declared
    /// operands, push the concrete result, and record a computed SSA node
    /// naming the operation and its inputs.
    pub(crate) fn op_alu(
        &mut self,
        state: &mut VmState,
        index: usize,
        op: Opcode,
    ) -> Result<ExecuteState, FaultReason> {
        let items = state.pop_n(op.pops())?;
        let (values, args): (Vec<U256>, Vec<SsaId>) = items.into_iter().unzip();

        let result = match apply(&op, &values) {
            Some(result) => result,
            None => return Ok(ExecuteState::Halt(HaltReason::InvalidInstruction)),
        };

        let id = self.ssa.computed(op, args);
        self.annotations[index] = Some(id);
        state.push(result, id)?;

        Ok(ExecuteState::Proceed)
    }
}
