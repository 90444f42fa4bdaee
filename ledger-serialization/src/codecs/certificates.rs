//! X.509 certificates and certificate paths, carried as DER.

use ledger_core::{CertPath, X509Certificate};

use crate::codec::Serializer;
use crate::descriptor::TypeName;
use crate::error::{SerializationError, SerializationResult};
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};

/// X.509 certificate.
pub const CERTIFICATE: TypeName = TypeName::new("ledger.crypto.X509Certificate", 1);
/// Certificate path, leaf first.
pub const CERT_PATH: TypeName = TypeName::new("ledger.crypto.CertPath", 1);

fn read_certificate(session: &mut DecodeSession<'_>) -> SerializationResult<X509Certificate> {
    let der = session.read_blob()?;
    X509Certificate::from_der(der).map_err(|e| SerializationError::malformed(format!("certificate: {e}")))
}

struct CertificateCodec;

impl Serializer<X509Certificate> for CertificateCodec {
    fn write(&self, session: &mut EncodeSession<'_>, cert: &X509Certificate) -> SerializationResult<()> {
        session.output().write_blob(cert.der())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<X509Certificate> {
        read_certificate(session)
    }
}

/// `varint(n) | blob(der)*n`
struct CertPathCodec;

impl Serializer<CertPath> for CertPathCodec {
    fn write(&self, session: &mut EncodeSession<'_>, path: &CertPath) -> SerializationResult<()> {
        let out = session.output();
        out.write_len(path.certificates().len())?;
        for cert in path.certificates() {
            out.write_blob(cert.der())?;
        }
        Ok(())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<CertPath> {
        let len = session.read_count("certificate path")?;
        let certificates = (0..len)
            .map(|_| read_certificate(session))
            .collect::<SerializationResult<Vec<_>>>()?;
        CertPath::new(certificates).map_err(|e| SerializationError::malformed(format!("certificate path: {e}")))
    }
}

pub(crate) fn register(r: &mut Registrar) -> SerializationResult<()> {
    r.register_override::<X509Certificate, _>(CERTIFICATE, CertificateCodec)?;
    r.register_override::<CertPath, _>(CERT_PATH, CertPathCodec)?;
    r.allow(CERTIFICATE)?;
    r.allow(CERT_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SerializationContext;
    use crate::engine::SerializationEngine;
    use crate::primitives::Output;

    fn generated_der(host: &str) -> Vec<u8> {
        let certified = rcgen::generate_simple_self_signed(vec![host.to_string()]).unwrap();
        certified.cert.der().to_vec()
    }

    #[test]
    fn test_certificate_round_trip() {
        let engine = SerializationEngine::with_defaults().unwrap();
        let ctx = SerializationContext::external_network();
        let cert = X509Certificate::from_der(&generated_der("node-a.example")).unwrap();
        let bytes = engine.encode(&cert, &ctx).unwrap();
        let decoded = engine.decode::<X509Certificate>(bytes.bytes(), &ctx).unwrap();
        assert_eq!(decoded.der(), cert.der());
        assert_eq!(decoded.fingerprint(), cert.fingerprint());
    }

    #[test]
    fn test_cert_path_round_trip() {
        let engine = SerializationEngine::with_defaults().unwrap();
        let ctx = SerializationContext::external_network();
        let path = CertPath::new(vec![
            X509Certificate::from_der(&generated_der("node-a.example")).unwrap(),
            X509Certificate::from_der(&generated_der("doorman.example")).unwrap(),
        ])
        .unwrap();
        let bytes = engine.encode(&path, &ctx).unwrap();
        assert_eq!(*engine.decode::<CertPath>(bytes.bytes(), &ctx).unwrap(), path);
    }

    #[test]
    fn test_corrupt_der_rejected() {
        let engine = SerializationEngine::with_defaults().unwrap();
        let ctx = SerializationContext::external_network();
        let mut der = generated_der("node-a.example");
        der.truncate(der.len() - 10);

        let mut out = Output::new();
        out.write_var_u32(1);
        out.write_str(CERTIFICATE.name()).unwrap();
        out.write_var_u32(1);
        out.write_blob(&der).unwrap();
        assert!(matches!(
            engine.decode::<X509Certificate>(out.as_slice(), &ctx),
            Err(SerializationError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_empty_path_rejected() {
        let engine = SerializationEngine::with_defaults().unwrap();
        let ctx = SerializationContext::external_network();
        let mut out = Output::new();
        out.write_var_u32(1);
        out.write_str(CERT_PATH.name()).unwrap();
        out.write_var_u32(1);
        out.write_var_u32(0);
        assert!(matches!(
            engine.decode::<CertPath>(out.as_slice(), &ctx),
            Err(SerializationError::MalformedStream(_))
        ));
    }
}
