//! Typed wrapper around an encoded byte stream.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::crypto::{sha256, SecureHash};

/// Bytes known to hold the encoding of a `T`.
///
/// The type parameter is a pure type-safety marker: the wrapper itself never
/// appears in an encoded stream, only its bytes.
pub struct SerializedBytes<T> {
    bytes: Vec<u8>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerializedBytes<T> {
    /// Wrap raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        SerializedBytes {
            bytes,
            _marker: PhantomData,
        }
    }

    /// The encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the wrapper and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of encoded bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// SHA-256 of the encoded bytes.
    pub fn hash(&self) -> SecureHash {
        sha256(&self.bytes)
    }
}

impl<T> Clone for SerializedBytes<T> {
    fn clone(&self) -> Self {
        SerializedBytes::new(self.bytes.clone())
    }
}

impl<T> PartialEq for SerializedBytes<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<T> Eq for SerializedBytes<T> {}

impl<T> Hash for SerializedBytes<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl<T> fmt::Debug for SerializedBytes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerializedBytes({} bytes, {})", self.bytes.len(), self.hash())
    }
}

impl<T> AsRef<[u8]> for SerializedBytes<T> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
