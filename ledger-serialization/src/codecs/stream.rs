//! Byte streams, drained in chunks.
//!
//! ```text
//! (fixed32(len) | bytes)* | fixed32(0)
//! ```
//!
//! Streams are buffered whole on decode. This path is for small, rare
//! payloads such as attachments embedded in a message.

use std::fmt;
use std::io::{self, Read};
use std::sync::Mutex;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::Serializer;
use crate::descriptor::TypeName;
use crate::error::{SerializationError, SerializationResult};
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};

/// Input stream.
pub const INPUT_STREAM: TypeName = TypeName::new("builtin.InputStream", 1);

/// A readable byte stream that can travel inside an encoded value.
///
/// Encoding consumes the stream.
pub struct InputStream {
    inner: Mutex<Box<dyn Read + Send>>,
}

impl InputStream {
    /// Wrap a reader.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Box::new(reader)),
        }
    }

    /// A stream over an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes.into().reader())
    }

    /// Read whatever remains of the stream.
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut reader = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("input stream lock poisoned"))?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStream").finish_non_exhaustive()
    }
}

struct InputStreamCodec;

impl Serializer<InputStream> for InputStreamCodec {
    fn write(&self, session: &mut EncodeSession<'_>, stream: &InputStream) -> SerializationResult<()> {
        let mut reader = stream
            .inner
            .lock()
            .map_err(|_| io::Error::other("input stream lock poisoned"))?;
        let mut chunk = vec![0u8; session.config().stream_chunk_size];
        let mut total = 0usize;
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let len = u32::try_from(n).map_err(|_| SerializationError::LimitExceeded {
                what: "stream chunk",
                len: n,
                max: u32::MAX as usize,
            })?;
            let out = session.output().buf_mut();
            out.put_u32(len);
            out.put_slice(&chunk[..n]);
            total += n;
        }
        session.output().buf_mut().put_u32(0);
        tracing::trace!(total, "drained input stream");
        Ok(())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<InputStream> {
        let max = session.config().max_blob_len;
        let mut buf = BytesMut::new();
        loop {
            let len = session.input().read_u32_fixed()? as usize;
            if len == 0 {
                break;
            }
            let total = buf.len() + len;
            if total > max {
                return Err(SerializationError::LimitExceeded {
                    what: "stream",
                    len: total,
                    max,
                });
            }
            buf.put_slice(session.input().read_raw(len)?);
        }
        Ok(InputStream::from_bytes(buf.freeze()))
    }
}

pub(crate) fn register(r: &mut Registrar) -> SerializationResult<()> {
    r.register_override::<InputStream, _>(INPUT_STREAM, InputStreamCodec)?;
    r.allow(INPUT_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::context::SerializationContext;
    use crate::engine::SerializationEngine;
    use crate::primitives::Output;
    use crate::value::Value;

    fn small_chunks() -> SerializationEngine {
        SerializationEngine::with_config(EngineConfig {
            stream_chunk_size: 4,
            max_blob_len: 16,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn header() -> Output {
        let mut out = Output::new();
        out.write_var_u32(1);
        out.write_str(INPUT_STREAM.name()).unwrap();
        out.write_var_u32(1);
        out
    }

    #[test]
    fn test_chunked_layout() {
        let engine = small_chunks();
        let ctx = SerializationContext::external_network();
        let stream = Value::object(InputStream::from_bytes(&b"abcdefghij"[..]));
        let bytes = engine.encode_value(&stream, &ctx).unwrap();

        let mut expected = header();
        for chunk in [&b"abcd"[..], b"efgh", b"ij"] {
            expected.write_u32_fixed(chunk.len() as u32);
            expected.write_raw(chunk);
        }
        expected.write_u32_fixed(0);
        assert_eq!(bytes, expected.into_vec());

        let decoded = engine.decode::<InputStream>(&bytes, &ctx).unwrap();
        assert_eq!(decoded.read_all().unwrap(), b"abcdefghij");
    }

    #[test]
    fn test_empty_stream() {
        let engine = small_chunks();
        let ctx = SerializationContext::external_network();
        let bytes = engine
            .encode_value(&Value::object(InputStream::from_bytes(Bytes::new())), &ctx)
            .unwrap();
        let decoded = engine.decode::<InputStream>(&bytes, &ctx).unwrap();
        assert!(decoded.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_oversized_stream_rejected() {
        let engine = small_chunks();
        let ctx = SerializationContext::external_network();
        let mut out = header();
        for _ in 0..5 {
            out.write_u32_fixed(4);
            out.write_raw(b"xxxx");
        }
        out.write_u32_fixed(0);
        assert!(matches!(
            engine.decode::<InputStream>(out.as_slice(), &ctx),
            Err(SerializationError::LimitExceeded { what: "stream", .. })
        ));
    }

    #[test]
    fn test_missing_terminator() {
        let engine = small_chunks();
        let ctx = SerializationContext::external_network();
        let mut out = header();
        out.write_u32_fixed(2);
        out.write_raw(b"ab");
        assert!(matches!(
            engine.decode::<InputStream>(out.as_slice(), &ctx),
            Err(SerializationError::UnexpectedEof { .. })
        ));
    }
}
