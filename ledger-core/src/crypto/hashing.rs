//! SHA-256 hashing and the [`SecureHash`] value type.

use std::fmt;

use sha2::{Digest, Sha256};

/// A SHA-256 digest used to identify transactions, attachments and states.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecureHash([u8; 32]);

impl SecureHash {
    /// The all-zero hash, used as the root of an empty tree.
    pub const ZERO: SecureHash = SecureHash([0u8; 32]);

    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        SecureHash(bytes)
    }

    /// Build a hash from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(SecureHash)
    }

    /// Get the raw digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash the concatenation of this hash and another.
    pub fn concat(&self, other: &SecureHash) -> SecureHash {
        sha256_concat(&[self.0.as_slice(), other.0.as_slice()])
    }
}

impl fmt::Debug for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureHash({})", hex::encode_upper(self.0))
    }
}

impl fmt::Display for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl AsRef<[u8]> for SecureHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Compute SHA-256 hash of the input data.
#[inline]
pub fn sha256(data: &[u8]) -> SecureHash {
    SecureHash(Sha256::digest(data).into())
}

/// Compute SHA-256 hash of concatenated data slices.
///
/// More efficient than allocating a buffer for concatenation.
pub fn sha256_concat(parts: &[&[u8]]) -> SecureHash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    SecureHash(hasher.finalize().into())
}

/// Compute the Merkle root of a list of hashes.
///
/// - Empty list returns [`SecureHash::ZERO`]
/// - Single hash returns that hash
/// - Otherwise pairs are hashed level by level, duplicating an odd leaf
pub fn merkle_root(hashes: &[SecureHash]) -> SecureHash {
    match hashes {
        [] => SecureHash::ZERO,
        [single] => *single,
        _ => {
            let mut level = hashes.to_vec();
            while level.len() > 1 {
                level = level
                    .chunks(2)
                    .map(|pair| match pair {
                        [left, right] => left.concat(right),
                        [odd] => odd.concat(odd),
                        _ => unreachable!("chunks(2) yields one or two elements"),
                    })
                    .collect();
            }
            level[0]
        }
    }
}
