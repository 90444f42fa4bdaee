//! Error types for the ledger core crate.

use std::fmt;

/// Top-level error type for ledger-core operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// Cryptographic operation failed.
    Crypto(CryptoError),
    /// A composite key failed structural validation.
    CompositeKey(CompositeKeyError),
    /// An X.500 distinguished name could not be parsed.
    Name(NameError),
    /// A certificate or certificate path is malformed.
    Certificate(CertificateError),
    /// A transaction violates a construction invariant.
    Transaction(TransactionError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Crypto(e) => write!(f, "crypto error: {}", e),
            CoreError::CompositeKey(e) => write!(f, "composite key error: {}", e),
            CoreError::Name(e) => write!(f, "name error: {}", e),
            CoreError::Certificate(e) => write!(f, "certificate error: {}", e),
            CoreError::Transaction(e) => write!(f, "transaction error: {}", e),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<CryptoError> for CoreError {
    fn from(e: CryptoError) -> Self {
        CoreError::Crypto(e)
    }
}

impl From<CompositeKeyError> for CoreError {
    fn from(e: CompositeKeyError) -> Self {
        CoreError::CompositeKey(e)
    }
}

impl From<NameError> for CoreError {
    fn from(e: NameError) -> Self {
        CoreError::Name(e)
    }
}

impl From<CertificateError> for CoreError {
    fn from(e: CertificateError) -> Self {
        CoreError::Certificate(e)
    }
}

impl From<TransactionError> for CoreError {
    fn from(e: TransactionError) -> Self {
        CoreError::Transaction(e)
    }
}

/// Errors related to cryptographic operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// The public key is malformed or invalid.
    InvalidPublicKey,
    /// The private key is malformed or invalid.
    InvalidPrivateKey,
    /// Encoded key material has the wrong length for its scheme.
    InvalidKeyLength { expected: usize, actual: usize },
    /// Signature verification failed (signature doesn't match message/key).
    SignatureVerificationFailed,
    /// No key material is implemented for this scheme.
    UnsupportedScheme(&'static str),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidPublicKey => write!(f, "invalid public key format"),
            CryptoError::InvalidPrivateKey => write!(f, "invalid private key format"),
            CryptoError::InvalidKeyLength { expected, actual } => {
                write!(f, "invalid key length: expected {} bytes, got {}", expected, actual)
            }
            CryptoError::SignatureVerificationFailed => write!(f, "signature verification failed"),
            CryptoError::UnsupportedScheme(name) => write!(f, "unsupported signature scheme {}", name),
        }
    }
}

impl std::error::Error for CryptoError {}

/// Structural violations detected while building a composite key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompositeKeyError {
    /// A composite key needs at least two children.
    TooFewChildren { count: usize },
    /// The threshold must be positive.
    ZeroThreshold,
    /// Every child weight must be positive.
    ZeroWeight,
    /// The same child node appears twice.
    DuplicateChild,
    /// The sum of child weights cannot reach the threshold.
    ThresholdUnreachable { threshold: u32, total_weight: u64 },
}

impl fmt::Display for CompositeKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeKeyError::TooFewChildren { count } => {
                write!(f, "composite key needs at least 2 children, got {}", count)
            }
            CompositeKeyError::ZeroThreshold => write!(f, "threshold must be greater than zero"),
            CompositeKeyError::ZeroWeight => write!(f, "child weights must be greater than zero"),
            CompositeKeyError::DuplicateChild => write!(f, "duplicated child nodes detected"),
            CompositeKeyError::ThresholdUnreachable { threshold, total_weight } => write!(
                f,
                "threshold {} exceeds total child weight {}",
                threshold, total_weight
            ),
        }
    }
}

impl std::error::Error for CompositeKeyError {}

/// Errors from parsing X.500 distinguished names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    /// The name has no attributes.
    Empty,
    /// An attribute is not of the form `KEY=value`.
    MalformedAttribute(String),
    /// The attribute key is not a supported RDN type.
    UnsupportedAttribute(String),
    /// The same attribute appears twice.
    DuplicateAttribute(String),
    /// The attribute value is empty or contains reserved characters.
    InvalidValue(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Empty => write!(f, "distinguished name is empty"),
            NameError::MalformedAttribute(a) => write!(f, "malformed attribute: {}", a),
            NameError::UnsupportedAttribute(a) => write!(f, "unsupported attribute: {}", a),
            NameError::DuplicateAttribute(a) => write!(f, "duplicate attribute: {}", a),
            NameError::InvalidValue(a) => write!(f, "invalid value for attribute {}", a),
        }
    }
}

impl std::error::Error for NameError {}

/// Errors from parsing DER-encoded certificates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CertificateError {
    /// Input ended in the middle of a DER element.
    Truncated,
    /// A DER element had an unexpected tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// A DER length uses an unsupported or non-minimal form.
    InvalidLength,
    /// Bytes remain after the outer certificate structure.
    TrailingData,
    /// A certificate path must hold at least one certificate.
    EmptyPath,
}

impl fmt::Display for CertificateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateError::Truncated => write!(f, "truncated DER input"),
            CertificateError::UnexpectedTag { expected, actual } => write!(
                f,
                "unexpected DER tag: expected 0x{:02x}, got 0x{:02x}",
                expected, actual
            ),
            CertificateError::InvalidLength => write!(f, "invalid DER length"),
            CertificateError::TrailingData => write!(f, "trailing data after certificate"),
            CertificateError::EmptyPath => write!(f, "certificate path is empty"),
        }
    }
}

impl std::error::Error for CertificateError {}

/// Transaction construction invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionError {
    /// Two component groups share an index.
    DuplicateComponentGroup { group_index: u32 },
    /// The privacy salt is all zeros.
    ZeroPrivacySalt,
    /// A privacy salt must be exactly 32 bytes.
    InvalidPrivacySaltLength { actual: usize },
    /// A notary change must consume at least one state.
    NoInputs,
    /// The old and new notary are the same party.
    SameNotary,
    /// A signed transaction carries no signatures.
    NoSignatures,
    /// A required signer did not sign.
    MissingSignature { key: String },
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::DuplicateComponentGroup { group_index } => {
                write!(f, "duplicated component group {}", group_index)
            }
            TransactionError::ZeroPrivacySalt => write!(f, "privacy salt must not be all zeros"),
            TransactionError::InvalidPrivacySaltLength { actual } => {
                write!(f, "privacy salt must be 32 bytes, got {}", actual)
            }
            TransactionError::NoInputs => write!(f, "notary change requires at least one input"),
            TransactionError::SameNotary => write!(f, "old and new notaries must be different"),
            TransactionError::NoSignatures => write!(f, "signed transaction has no signatures"),
            TransactionError::MissingSignature { key } => write!(f, "missing signature from {}", key),
        }
    }
}

impl std::error::Error for TransactionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = CoreError::Crypto(CryptoError::InvalidPublicKey);
        assert!(e.to_string().contains("invalid public key"));

        let e = CoreError::CompositeKey(CompositeKeyError::TooFewChildren { count: 1 });
        assert!(e.to_string().contains("at least 2 children"));

        let e = CoreError::Certificate(CertificateError::UnexpectedTag { expected: 0x30, actual: 0x02 });
        assert!(e.to_string().contains("0x30"));
    }

    #[test]
    fn test_error_conversion() {
        let name_err = NameError::Empty;
        let core_err: CoreError = name_err.into();
        assert!(matches!(core_err, CoreError::Name(NameError::Empty)));

        let tx_err: CoreError = TransactionError::SameNotary.into();
        assert!(matches!(tx_err, CoreError::Transaction(TransactionError::SameNotary)));
    }
}
