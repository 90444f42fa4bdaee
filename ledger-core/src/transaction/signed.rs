//! Signed transaction wrapper.

use super::CoreTransaction;
use crate::crypto::{sign, verify, KeyPair, PublicKey, SecureHash, Signature};
use crate::error::{CryptoError, TransactionError};
use crate::serialized::SerializedBytes;

/// A signature over a transaction id, with the key that made it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionSignature {
    /// The Ed25519 signature bytes.
    pub bytes: Signature,
    /// The signing key.
    pub by: PublicKey,
}

impl TransactionSignature {
    /// Sign a transaction id.
    pub fn create(key_pair: &KeyPair, id: &SecureHash) -> Self {
        TransactionSignature {
            bytes: sign(key_pair.private_key(), id.as_bytes()),
            by: key_pair.public_key(),
        }
    }

    /// Check this signature against a transaction id.
    pub fn verify(&self, id: &SecureHash) -> Result<(), CryptoError> {
        verify(&self.by, id.as_bytes(), &self.bytes)
    }
}

/// An encoded transaction together with the signatures over it.
///
/// The transaction is kept in encoded form so that the signed bytes are
/// exactly the bytes that travel. The id is the id of the transaction those
/// bytes hold, the same value [`CoreTransaction::id`] gives, so signatures
/// made over the unsigned transaction verify here unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    tx_bits: SerializedBytes<CoreTransaction>,
    id: SecureHash,
    sigs: Vec<TransactionSignature>,
}

impl SignedTransaction {
    /// Create a signed transaction; at least one signature is required.
    ///
    /// `id` must be the id of the transaction encoded in `tx_bits`. Decoders
    /// recompute it from the bits rather than trusting a carried value.
    pub fn new(
        tx_bits: SerializedBytes<CoreTransaction>,
        id: SecureHash,
        sigs: Vec<TransactionSignature>,
    ) -> Result<Self, TransactionError> {
        if sigs.is_empty() {
            return Err(TransactionError::NoSignatures);
        }
        Ok(SignedTransaction { tx_bits, id, sigs })
    }

    /// Transaction id, equal to the wrapped transaction's id.
    pub fn id(&self) -> SecureHash {
        self.id
    }

    /// The encoded transaction.
    pub fn tx_bits(&self) -> &SerializedBytes<CoreTransaction> {
        &self.tx_bits
    }

    /// Signatures in the order they were added.
    pub fn sigs(&self) -> &[TransactionSignature] {
        &self.sigs
    }

    /// Add a signature, returning a new signed transaction.
    pub fn with_signature(&self, sig: TransactionSignature) -> Self {
        let mut sigs = self.sigs.clone();
        sigs.push(sig);
        SignedTransaction {
            tx_bits: self.tx_bits.clone(),
            id: self.id,
            sigs,
        }
    }

    /// Verify every attached signature against the id.
    pub fn verify_signatures(&self) -> Result<(), CryptoError> {
        let id = self.id();
        self.sigs.iter().try_for_each(|sig| sig.verify(&id))
    }

    /// Verify signatures and check that every required key signed.
    pub fn verify_required_signatures(&self, required: &[PublicKey]) -> Result<(), TransactionError> {
        self.verify_signatures().map_err(|_| TransactionError::MissingSignature {
            key: "invalid signature".to_string(),
        })?;
        for key in required {
            if !self.sigs.iter().any(|sig| &sig.by == key) {
                return Err(TransactionError::MissingSignature {
                    key: key.to_short_string(),
                });
            }
        }
        Ok(())
    }
}
