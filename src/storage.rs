//! Persistent contract storage.

use primitive_types::U256;

use std::collections::BTreeMap;
use std::fmt;

/// Sparse mapping from 256-bit key to 256-bit value.
///
/// Missing keys read as zero. Writing zero retains the entry; `sload`
/// cannot tell the difference. Ordered so trace snapshots render
/// deterministically.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Storage {
    slots: BTreeMap<U256, U256>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value at `key`; zero if never written.
    pub fn sload(&self, key: &U256) -> U256 {
        self.slots.get(key).copied().unwrap_or_default()
    }

    /// Write `value` at `key`.
    pub fn sstore(&mut self, key: U256, value: U256) {
        self.slots.insert(key, value);
    }

    /// Number of written slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate written slots in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&U256, &U256)> {
        self.slots.iter()
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key:#x}: {value:#x}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(U256, U256)> for Storage {
    fn from_iter<I: IntoIterator<Item = (U256, U256)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}
