//! Function-signature lookup.

use std::collections::HashMap;

/// Injected mapping from 4-byte selectors to human-readable signatures.
///
/// Keys are `0x`-prefixed lowercase hex selector strings, e.g.
/// `0xa9059cbb` for `transfer(address,uint256)`. The database is built
/// once by the caller; this crate never touches the filesystem.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignatureDb {
    entries: HashMap<String, String>,
}

impl SignatureDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a selector by numeric value.
    pub fn insert(&mut self, selector: u32, name: impl Into<String>) {
        self.entries.insert(format!("{selector:#x}"), name.into());
    }

    /// Preferred name for `selector`, if known.
    pub fn lookup(&self, selector: u32) -> Option<&str> {
        self.entries.get(&format!("{selector:#x}")).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for SignatureDb {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, String)> for SignatureDb {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
