//! Ed25519 signature creation and verification.

use std::fmt;

use ed25519_dalek::{Signer, Verifier, SIGNATURE_LENGTH};

use super::keys::{PrivateKey, PublicKey};
use crate::error::CryptoError;

/// Ed25519 signature wrapper.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub ed25519_dalek::Signature);

impl Signature {
    /// Create a Signature from raw bytes.
    pub fn from_bytes(bytes: &[u8; SIGNATURE_LENGTH]) -> Self {
        Signature(ed25519_dalek::Signature::from_bytes(bytes))
    }

    /// Create a Signature from a slice, which must be exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw: [u8; SIGNATURE_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Signature::from_bytes(&raw))
    }

    /// Get the raw bytes of the signature.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.to_bytes()[..8]))
    }
}

/// Sign a message with a private key.
pub fn sign(private_key: &PrivateKey, message: &[u8]) -> Signature {
    Signature(private_key.signing_key().sign(message))
}

/// Verify a signature against a message and public key.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
    public_key
        .inner()
        .verify(message, &signature.0)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let signature = sign(kp.private_key(), b"test message");
        assert!(verify(&kp.public_key(), b"test message", &signature).is_ok());
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let kp = KeyPair::generate();
        let signature = sign(kp.private_key(), b"test message");
        let result = verify(&kp.public_key(), b"wrong message", &signature);
        assert!(matches!(result, Err(CryptoError::SignatureVerificationFailed)));
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let signature = sign(kp1.private_key(), b"test message");
        assert!(verify(&kp2.public_key(), b"test message", &signature).is_err());
    }

    #[test]
    fn test_signature_determinism() {
        let kp = KeyPair::generate();
        // Ed25519 signatures are deterministic
        assert_eq!(sign(kp.private_key(), b"m"), sign(kp.private_key(), b"m"));
    }

    #[test]
    fn test_signature_from_slice() {
        let kp = KeyPair::generate();
        let signature = sign(kp.private_key(), b"test message");
        let recovered = Signature::from_slice(&signature.to_bytes()).unwrap();
        assert_eq!(signature, recovered);
        assert!(Signature::from_slice(&[0u8; 10]).is_err());
    }
}
