//! Component groups and the salt that blinds them.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::{merkle_root, sha256_concat, SecureHash};
use crate::error::TransactionError;

/// An uninterpreted byte payload.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct OpaqueBytes(pub Vec<u8>);

impl OpaqueBytes {
    /// Wrap a byte vector.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        OpaqueBytes(bytes.into())
    }

    /// The payload.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for OpaqueBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueBytes({})", hex::encode(&self.0))
    }
}

/// 32 random bytes mixed into every component hash of a transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrivacySalt([u8; 32]);

impl PrivacySalt {
    /// Wrap salt bytes; an all-zero salt is rejected.
    pub fn new(bytes: [u8; 32]) -> Result<Self, TransactionError> {
        if bytes.iter().all(|b| *b == 0) {
            return Err(TransactionError::ZeroPrivacySalt);
        }
        Ok(PrivacySalt(bytes))
    }

    /// Build from a slice of exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TransactionError> {
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TransactionError::InvalidPrivacySaltLength { actual: bytes.len() })?;
        PrivacySalt::new(raw)
    }

    /// Fresh salt from the OS random number generator.
    pub fn random() -> Self {
        loop {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            if let Ok(salt) = PrivacySalt::new(bytes) {
                return salt;
            }
        }
    }

    /// The salt bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PrivacySalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivacySalt({}..)", hex::encode(&self.0[..4]))
    }
}

/// Well-known component group indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ComponentGroupKind {
    /// Consumed states.
    Inputs = 0,
    /// Created states.
    Outputs = 1,
    /// Commands.
    Commands = 2,
    /// Attachment hashes.
    Attachments = 3,
    /// The notary.
    Notary = 4,
    /// The time window.
    TimeWindow = 5,
    /// Command signers.
    Signers = 6,
}

/// All components of one kind, in order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentGroup {
    /// Index identifying the kind of component.
    pub group_index: u32,
    /// Serialized components.
    pub components: Vec<OpaqueBytes>,
}

impl ComponentGroup {
    /// Create a group.
    pub fn new(group_index: u32, components: Vec<OpaqueBytes>) -> Self {
        ComponentGroup {
            group_index,
            components,
        }
    }

    /// Create a group of a well-known kind.
    pub fn of_kind(kind: ComponentGroupKind, components: Vec<OpaqueBytes>) -> Self {
        ComponentGroup::new(kind as u32, components)
    }

    /// Merkle root over salted component hashes.
    ///
    /// Leaf `i` is `SHA-256(salt || group_index || i || component)`.
    pub fn root(&self, salt: &PrivacySalt) -> SecureHash {
        let leaves: Vec<SecureHash> = self
            .components
            .iter()
            .enumerate()
            .map(|(i, component)| {
                sha256_concat(&[
                    salt.as_bytes().as_slice(),
                    self.group_index.to_be_bytes().as_slice(),
                    (i as u32).to_be_bytes().as_slice(),
                    component.bytes(),
                ])
            })
            .collect();
        merkle_root(&leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_salt_rejected() {
        assert_eq!(PrivacySalt::new([0u8; 32]), Err(TransactionError::ZeroPrivacySalt));
        assert!(PrivacySalt::new([1u8; 32]).is_ok());
    }

    #[test]
    fn test_salt_from_slice_length() {
        assert_eq!(
            PrivacySalt::from_slice(&[1u8; 16]),
            Err(TransactionError::InvalidPrivacySaltLength { actual: 16 })
        );
    }

    #[test]
    fn test_random_salts_differ() {
        assert_ne!(PrivacySalt::random(), PrivacySalt::random());
    }

    #[test]
    fn test_group_root_depends_on_salt() {
        let group = ComponentGroup::of_kind(
            ComponentGroupKind::Outputs,
            vec![OpaqueBytes::new(b"a".to_vec()), OpaqueBytes::new(b"b".to_vec())],
        );
        let s1 = PrivacySalt::new([1u8; 32]).unwrap();
        let s2 = PrivacySalt::new([2u8; 32]).unwrap();
        assert_ne!(group.root(&s1), group.root(&s2));
        assert_eq!(group.root(&s1), group.root(&s1));
    }
}
