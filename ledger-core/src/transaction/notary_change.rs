//! Notary change transactions.

use super::state_ref::StateRef;
use crate::crypto::{sha256_concat, SecureHash};
use crate::error::TransactionError;
use crate::identity::Party;

/// Moves a set of states from one notary to another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotaryChangeWireTransaction {
    inputs: Vec<StateRef>,
    notary: Party,
    new_notary: Party,
}

impl NotaryChangeWireTransaction {
    /// Create a notary change. Needs inputs and two distinct notaries.
    pub fn new(inputs: Vec<StateRef>, notary: Party, new_notary: Party) -> Result<Self, TransactionError> {
        if inputs.is_empty() {
            return Err(TransactionError::NoInputs);
        }
        if notary == new_notary {
            return Err(TransactionError::SameNotary);
        }
        Ok(NotaryChangeWireTransaction {
            inputs,
            notary,
            new_notary,
        })
    }

    /// States being moved.
    pub fn inputs(&self) -> &[StateRef] {
        &self.inputs
    }

    /// Current notary.
    pub fn notary(&self) -> &Party {
        &self.notary
    }

    /// Notary the states move to.
    pub fn new_notary(&self) -> &Party {
        &self.new_notary
    }

    /// Transaction id over inputs and both notaries.
    pub fn id(&self) -> SecureHash {
        let inputs: Vec<[u8; 36]> = self.inputs.iter().map(StateRef::to_bytes).collect();
        let notary_name = self.notary.name.canonical();
        let new_notary_name = self.new_notary.name.canonical();

        let mut parts: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
        parts.push(notary_name.as_bytes());
        parts.push(self.notary.owning_key.as_bytes());
        parts.push(new_notary_name.as_bytes());
        parts.push(self.new_notary.owning_key.as_bytes());
        sha256_concat(&parts)
    }
}
