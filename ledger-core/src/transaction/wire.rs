//! Regular transactions.

use std::collections::HashSet;

use super::component::{ComponentGroup, PrivacySalt};
use crate::crypto::{merkle_root, SecureHash};
use crate::error::TransactionError;

/// A transaction in its wire form: component groups plus salt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireTransaction {
    component_groups: Vec<ComponentGroup>,
    privacy_salt: PrivacySalt,
}

impl WireTransaction {
    /// Create a transaction. Group indices must be unique.
    pub fn new(
        component_groups: Vec<ComponentGroup>,
        privacy_salt: PrivacySalt,
    ) -> Result<Self, TransactionError> {
        let mut seen = HashSet::new();
        for group in &component_groups {
            if !seen.insert(group.group_index) {
                return Err(TransactionError::DuplicateComponentGroup {
                    group_index: group.group_index,
                });
            }
        }
        Ok(WireTransaction {
            component_groups,
            privacy_salt,
        })
    }

    /// Component groups in declaration order.
    pub fn component_groups(&self) -> &[ComponentGroup] {
        &self.component_groups
    }

    /// The privacy salt.
    pub fn privacy_salt(&self) -> &PrivacySalt {
        &self.privacy_salt
    }

    /// Transaction id: the Merkle root over the group roots.
    pub fn id(&self) -> SecureHash {
        let roots: Vec<SecureHash> = self
            .component_groups
            .iter()
            .map(|group| group.root(&self.privacy_salt))
            .collect();
        merkle_root(&roots)
    }
}
