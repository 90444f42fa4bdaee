//! References to transaction outputs.

use std::fmt;

use crate::crypto::SecureHash;

/// Points at output `index` of transaction `txhash`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateRef {
    /// Id of the transaction that created the state.
    pub txhash: SecureHash,
    /// Output index within that transaction.
    pub index: u32,
}

impl StateRef {
    /// Create a reference.
    pub fn new(txhash: SecureHash, index: u32) -> Self {
        StateRef { txhash, index }
    }

    /// Canonical bytes: hash followed by big-endian index.
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(self.txhash.as_bytes());
        out[32..].copy_from_slice(&self.index.to_be_bytes());
        out
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.txhash, self.index)
    }
}
