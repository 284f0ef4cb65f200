//! Static-single-assignment records for stack slots.
//!
//! Every value the emulator pushes is named by a node in an arena. The
//! arena index doubles as the assignment index, so ids are strictly
//! increasing and the value graph is acyclic by construction.

use crate::interpreter::alu;
use crate::opcode::Opcode;

use itertools::Itertools;
use primitive_types::U256;

/// Identifier of an SSA node; the position of the node in its arena.
pub type SsaId = usize;

/// A named stack-slot value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum SsaValue {
    /// A literal pushed by a PUSH instruction.
    Constant(U256),
    /// A value computed from other slots.
    Computed {
        /// Producing opcode.
        op: Opcode,
        /// Inputs, in pop order (top of stack first).
        args: Vec<SsaId>,
    },
    /// An abstract input of the program (calldata, environment, ...).
    Input(Opcode),
}

/// Append-only arena of SSA nodes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SsaArena {
    nodes: Vec<SsaValue>,
}

impl SsaArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: SsaValue) -> SsaId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Record a literal value.
    pub fn constant(&mut self, value: U256) -> SsaId {
        self.push(SsaValue::Constant(value))
    }

    /// Record a computed value with its inputs in pop order.
    pub fn computed(&mut self, op: Opcode, args: Vec<SsaId>) -> SsaId {
        self.push(SsaValue::Computed { op, args })
    }

    /// Record an abstract program input.
    pub fn input(&mut self, op: Opcode) -> SsaId {
        self.push(SsaValue::Input(op))
    }

    pub fn node(&self, id: SsaId) -> Option<&SsaValue> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reduce the expression rooted at `id` to a concrete word.
    ///
    /// Succeeds only when every leaf is a constant and every interior node
    /// is a pure arithmetic/comparison/bitwise operation; abstract inputs
    /// make the expression irreducible.
    pub fn evaluate(&self, id: SsaId) -> Option<U256> {
        match self.node(id)? {
            SsaValue::Constant(value) => Some(*value),
            SsaValue::Input(_) => None,
            SsaValue::Computed { op, args } if op.is_pure() => {
                let inputs = args
                    .iter()
                    .map(|arg| self.evaluate(*arg))
                    .collect::<Option<Vec<_>>>()?;

                alu::apply(op, &inputs)
            }
            SsaValue::Computed { .. } => None,
        }
    }

    /// Render the expression rooted at `id` for diagnostics, e.g.
    /// `ADD(0x5, CALLDATALOAD(0x4))`.
    pub fn format(&self, id: SsaId) -> String {
        match self.node(id) {
            None => format!("<missing %{id}>"),
            Some(SsaValue::Constant(value)) => format!("{value:#x}"),
            Some(SsaValue::Input(op)) => op.to_string(),
            Some(SsaValue::Computed { op, args }) => {
                let args = args.iter().map(|arg| self.format(*arg)).join(", ");
                format!("{op}({args})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_monotonically() {
        let mut arena = SsaArena::new();
        let a = arena.constant(U256::from(1));
        let b = arena.input(Opcode::CALLER);
        let c = arena.computed(Opcode::ADD, vec![a, b]);

        assert!(a < b && b < c);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn constant_subtrees_evaluate() {
        let mut arena = SsaArena::new();
        let five = arena.constant(U256::from(5));
        let three = arena.constant(U256::from(3));
        let sum = arena.computed(Opcode::ADD, vec![five, three]);

        assert_eq!(arena.evaluate(sum), Some(U256::from(8)));
    }

    #[test]
    fn abstract_inputs_are_irreducible() {
        let mut arena = SsaArena::new();
        let load = arena.input(Opcode::CALLDATALOAD);
        let four = arena.constant(U256::from(4));
        let sum = arena.computed(Opcode::ADD, vec![load, four]);

        assert_eq!(arena.evaluate(sum), None);
    }

    #[test]
    fn impure_nodes_are_irreducible() {
        let mut arena = SsaArena::new();
        let offset = arena.constant(U256::zero());
        let load = arena.computed(Opcode::MLOAD, vec![offset]);

        assert_eq!(arena.evaluate(load), None);
    }

    #[test]
    fn format_renders_nested_expressions() {
        let mut arena = SsaArena::new();
        let five = arena.constant(U256::from(5));
        let load = arena.input(Opcode::CALLDATALOAD);
        let sum = arena.computed(Opcode::ADD, vec![five, load]);

        assert_eq!(arena.format(sum), "ADD(0x5, CALLDATALOAD)");
    }
}
