//! Ed25519 key pairs and their canonical encodings.

use std::fmt;
use std::hash::{Hash, Hasher};

use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Signature schemes a key can be declared with.
///
/// Only Ed25519 has key material in this crate; the others exist so that
/// keys declared under them can be named and rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    /// EdDSA over edwards25519 with SHA-512.
    Ed25519Sha512,
    /// ECDSA over NIST P-256 with SHA-256.
    EcdsaSecp256r1Sha256,
    /// ECDSA over secp256k1 with SHA-256.
    EcdsaSecp256k1Sha256,
}

impl SignatureScheme {
    /// Stable code name, as used in configuration and diagnostics.
    pub fn code_name(&self) -> &'static str {
        match self {
            SignatureScheme::Ed25519Sha512 => "EDDSA_ED25519_SHA512",
            SignatureScheme::EcdsaSecp256r1Sha256 => "ECDSA_SECP256R1_SHA256",
            SignatureScheme::EcdsaSecp256k1Sha256 => "ECDSA_SECP256K1_SHA256",
        }
    }

    /// Look up a scheme by its code name.
    pub fn from_code_name(name: &str) -> Option<Self> {
        match name {
            "EDDSA_ED25519_SHA512" => Some(SignatureScheme::Ed25519Sha512),
            "ECDSA_SECP256R1_SHA256" => Some(SignatureScheme::EcdsaSecp256r1Sha256),
            "ECDSA_SECP256K1_SHA256" => Some(SignatureScheme::EcdsaSecp256k1Sha256),
            _ => None,
        }
    }
}

/// Key material with a canonical standard binary form.
///
/// Encoding and decoding are inverse: `K::decode(k.scheme(), &k.encoded())`
/// yields a key equal to `k`.
pub trait AsymmetricKey: Sized {
    /// The scheme this key instance belongs to.
    fn scheme(&self) -> SignatureScheme;

    /// The canonical encoded form.
    fn encoded(&self) -> Vec<u8>;

    /// Re-parse the canonical form for the given scheme.
    fn decode(scheme: SignatureScheme, bytes: &[u8]) -> Result<Self, CryptoError>;
}

/// Ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(pub VerifyingKey);

impl PublicKey {
    /// Create a PublicKey from raw bytes.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Get the raw bytes of the public key.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.0.as_bytes()
    }

    /// Get the inner VerifyingKey.
    #[inline]
    pub fn inner(&self) -> &VerifyingKey {
        &self.0
    }

    /// Short hex form used in logs and error messages.
    pub fn to_short_string(&self) -> String {
        hex::encode(&self.as_bytes()[..8])
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.as_bytes()))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        PublicKey(key)
    }
}

impl AsymmetricKey for PublicKey {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Ed25519Sha512
    }

    fn encoded(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(scheme: SignatureScheme, bytes: &[u8]) -> Result<Self, CryptoError> {
        match scheme {
            SignatureScheme::Ed25519Sha512 => {
                let raw: [u8; PUBLIC_KEY_LENGTH] =
                    bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                        expected: PUBLIC_KEY_LENGTH,
                        actual: bytes.len(),
                    })?;
                PublicKey::from_bytes(&raw)
            }
            other => Err(CryptoError::UnsupportedScheme(other.code_name())),
        }
    }
}

/// Ed25519 private key. The canonical form is the 32-byte seed.
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Create a private key from its seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        PrivateKey(SigningKey::from_bytes(seed))
    }

    /// Get the seed bytes.
    ///
    /// Use with extreme caution - exposing these bytes compromises the key.
    pub fn seed(&self) -> &[u8; SECRET_KEY_LENGTH] {
        self.0.as_bytes()
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Get the inner signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.0
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        PrivateKey::from_seed(self.seed())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.seed() == other.seed()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(public: {})", self.public_key().to_short_string())
    }
}

impl AsymmetricKey for PrivateKey {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Ed25519Sha512
    }

    fn encoded(&self) -> Vec<u8> {
        self.seed().to_vec()
    }

    fn decode(scheme: SignatureScheme, bytes: &[u8]) -> Result<Self, CryptoError> {
        match scheme {
            SignatureScheme::Ed25519Sha512 => {
                let seed: [u8; SECRET_KEY_LENGTH] =
                    bytes.try_into().map_err(|_| CryptoError::InvalidPrivateKey)?;
                Ok(PrivateKey::from_seed(&seed))
            }
            other => Err(CryptoError::UnsupportedScheme(other.code_name())),
        }
    }
}

/// Ed25519 key pair.
///
/// The secret key should be kept secure and never transmitted.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private: PrivateKey,
}

impl KeyPair {
    /// Generate a new random key pair using the OS random number generator.
    pub fn generate() -> Self {
        KeyPair {
            private: PrivateKey(SigningKey::generate(&mut OsRng)),
        }
    }

    /// Create a key pair from a 32-byte secret seed.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Self {
        KeyPair {
            private: PrivateKey::from_seed(bytes),
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        self.private.public_key()
    }

    /// Get the private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Get the signing (secret) key.
    pub fn signing_key(&self) -> &SigningKey {
        self.private.signing_key()
    }
}
