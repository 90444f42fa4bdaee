//! # Ledger Core
//!
//! Core types and cryptography for the ledger.
//!
//! This crate provides the values that the serialization engine moves
//! between nodes and to disk:
//! - Cryptographic primitives (Ed25519 keys and signatures, SHA-256, Merkle roots)
//! - Composite (threshold) keys
//! - X.500 names, parties, and X.509 certificates
//! - The transaction model (component groups, wire, notary-change and signed transactions)
//! - Portable error records

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crypto;
pub mod error;
pub mod failure;
pub mod identity;
pub mod serialized;
pub mod transaction;

// Re-export commonly used types at crate root
pub use crypto::{
    AsymmetricKey, CertPath, CompositeKey, KeyNode, KeyPair, NodeAndWeight, PrivateKey, PublicKey,
    SecureHash, Signature, SignatureScheme, X509Certificate,
};
pub use error::{
    CertificateError, CompositeKeyError, CoreError, CryptoError, NameError, TransactionError,
};
pub use failure::{ErrorRecord, Suppressed};
pub use identity::{Party, X500Name};
pub use serialized::SerializedBytes;
pub use transaction::{
    ComponentGroup, CoreTransaction, NotaryChangeWireTransaction, OpaqueBytes, PrivacySalt,
    SignedTransaction, StateRef, TransactionSignature, WireTransaction,
};
