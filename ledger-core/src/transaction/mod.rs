//! Transaction model.
//!
//! A [`WireTransaction`] carries its content as ordered component groups of
//! opaque bytes, salted so that Merkle leaves cannot be guessed. A
//! [`NotaryChangeWireTransaction`] moves states to a new notary. Either is
//! wrapped, in encoded form, by a [`SignedTransaction`].
//!
//! Field order of every type here is load-bearing: signatures are taken over
//! their encodings.

mod component;
mod notary_change;
mod signed;
mod state_ref;
mod wire;

pub use component::{ComponentGroup, ComponentGroupKind, OpaqueBytes, PrivacySalt};
pub use notary_change::NotaryChangeWireTransaction;
pub use signed::{SignedTransaction, TransactionSignature};
pub use state_ref::StateRef;
pub use wire::WireTransaction;

/// Any transaction that can be signed and notarised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreTransaction {
    /// A regular transaction.
    Wire(WireTransaction),
    /// A notary change.
    NotaryChange(NotaryChangeWireTransaction),
}

impl CoreTransaction {
    /// The transaction id.
    pub fn id(&self) -> crate::crypto::SecureHash {
        match self {
            CoreTransaction::Wire(tx) => tx.id(),
            CoreTransaction::NotaryChange(tx) => tx.id(),
        }
    }
}
