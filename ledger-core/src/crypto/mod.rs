//! Cryptographic primitives for the ledger.
//!
//! This module provides:
//! - Ed25519 key pairs, signing, and verification
//! - SHA-256 hashing and Merkle roots
//! - Composite (threshold) keys
//! - X.509 certificates and certificate paths in DER form

pub mod certificate;
mod composite;
mod hashing;
mod keys;
mod signing;

pub use certificate::{CertPath, X509Certificate};
pub use composite::{CompositeKey, CompositeKeyBuilder, KeyNode, NodeAndWeight};
pub use hashing::{merkle_root, sha256, sha256_concat, SecureHash};
pub use keys::{AsymmetricKey, KeyPair, PrivateKey, PublicKey, SignatureScheme};
pub use signing::{sign, verify, Signature};
