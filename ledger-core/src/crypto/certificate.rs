//! X.509 certificates held in their DER form.
//!
//! Only the outer structure is checked: a certificate is a DER `SEQUENCE`
//! holding `tbsCertificate`, `signatureAlgorithm` and a `BIT STRING`
//! signature value, with nothing after it.

use crate::crypto::hashing::{sha256, SecureHash};
use crate::error::CertificateError;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_BIT_STRING: u8 = 0x03;

/// Read one DER element, returning `(tag, contents, rest)`.
fn read_element(input: &[u8]) -> Result<(u8, &[u8], &[u8]), CertificateError> {
    let (&tag, rest) = input.split_first().ok_or(CertificateError::Truncated)?;
    let (&first, mut rest) = rest.split_first().ok_or(CertificateError::Truncated)?;

    let length = if first < 0x80 {
        usize::from(first)
    } else {
        let count = usize::from(first & 0x7f);
        // Indefinite lengths are not DER; more than 4 length bytes is absurd here.
        if count == 0 || count > 4 || rest.len() < count {
            return Err(CertificateError::InvalidLength);
        }
        let (len_bytes, tail) = rest.split_at(count);
        if len_bytes[0] == 0 {
            return Err(CertificateError::InvalidLength);
        }
        rest = tail;
        let length = len_bytes
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        if length < 0x80 {
            return Err(CertificateError::InvalidLength);
        }
        length
    };

    if rest.len() < length {
        return Err(CertificateError::Truncated);
    }
    let (contents, rest) = rest.split_at(length);
    Ok((tag, contents, rest))
}

fn expect_element(input: &[u8], expected: u8) -> Result<(&[u8], &[u8]), CertificateError> {
    let (tag, contents, rest) = read_element(input)?;
    if tag != expected {
        return Err(CertificateError::UnexpectedTag {
            expected,
            actual: tag,
        });
    }
    Ok((contents, rest))
}

/// A DER-encoded X.509 certificate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct X509Certificate {
    der: Vec<u8>,
}

impl X509Certificate {
    /// Parse a certificate from DER bytes.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (body, trailing) = expect_element(der, TAG_SEQUENCE)?;
        if !trailing.is_empty() {
            return Err(CertificateError::TrailingData);
        }
        let (_, rest) = expect_element(body, TAG_SEQUENCE)?;
        let (_, rest) = expect_element(rest, TAG_SEQUENCE)?;
        let (_, rest) = expect_element(rest, TAG_BIT_STRING)?;
        if !rest.is_empty() {
            return Err(CertificateError::TrailingData);
        }
        Ok(X509Certificate { der: der.to_vec() })
    }

    /// The canonical DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 fingerprint of the DER encoding.
    pub fn fingerprint(&self) -> SecureHash {
        sha256(&self.der)
    }
}

/// An ordered chain of certificates, leaf first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CertPath {
    certificates: Vec<X509Certificate>,
}

impl CertPath {
    /// Build a path; it must hold at least one certificate.
    pub fn new(certificates: Vec<X509Certificate>) -> Result<Self, CertificateError> {
        if certificates.is_empty() {
            return Err(CertificateError::EmptyPath);
        }
        Ok(CertPath { certificates })
    }

    /// Certificates in path order.
    pub fn certificates(&self) -> &[X509Certificate] {
        &self.certificates
    }

    /// The first certificate of the path.
    pub fn leaf(&self) -> &X509Certificate {
        &self.certificates[0]
    }
}
