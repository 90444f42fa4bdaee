//! Keys, signatures, hashes and composite keys.

use std::marker::PhantomData;
use std::sync::Arc;

use ledger_core::crypto::{CompositeKey, KeyNode, NodeAndWeight};
use ledger_core::{AsymmetricKey, PrivateKey, PublicKey, SecureHash, Signature, SignatureScheme};

use super::constructor_failed;
use crate::codec::Serializer;
use crate::descriptor::{FieldType, TypeName};
use crate::error::{SerializationError, SerializationResult};
use crate::generic::ImmutableSchema;
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Payload, Value};

/// Ed25519 public key.
pub const PUBLIC_KEY: TypeName = TypeName::new("ledger.crypto.PublicKey", 1);
/// Ed25519 private key. Never whitelisted for the network.
pub const PRIVATE_KEY: TypeName = TypeName::new("ledger.crypto.PrivateKey", 1);
/// Ed25519 signature.
pub const SIGNATURE: TypeName = TypeName::new("ledger.crypto.Signature", 1);
/// SHA-256 hash.
pub const SECURE_HASH: TypeName = TypeName::new("ledger.crypto.SecureHash", 1);
/// Threshold key.
pub const COMPOSITE_KEY: TypeName = TypeName::new("ledger.crypto.CompositeKey", 1);
/// Child of a threshold key.
pub const NODE_AND_WEIGHT: TypeName = TypeName::new("ledger.crypto.NodeAndWeight", 1);

/// Writes a key in its canonical encoded form and re-parses it on read.
///
/// The codec is bound to one scheme. Encoding a key that reports a different
/// scheme means the in-memory key is not what the caller registered it as,
/// and fails with [`SerializationError::KeyParameterMismatch`].
pub struct KeyCodec<K> {
    scheme: SignatureScheme,
    _marker: PhantomData<fn() -> K>,
}

impl<K> KeyCodec<K> {
    /// Codec for keys of `scheme`.
    pub fn new(scheme: SignatureScheme) -> Self {
        Self {
            scheme,
            _marker: PhantomData,
        }
    }
}

impl<K: AsymmetricKey + Payload> Serializer<K> for KeyCodec<K> {
    fn write(&self, session: &mut EncodeSession<'_>, key: &K) -> SerializationResult<()> {
        let actual = key.scheme();
        if actual != self.scheme {
            return Err(SerializationError::KeyParameterMismatch {
                expected: self.scheme.code_name(),
                actual: actual.code_name(),
            });
        }
        session.output().write_blob(&key.encoded())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<K> {
        let bytes = session.read_blob()?;
        K::decode(self.scheme, bytes).map_err(|e| {
            SerializationError::malformed(format!("{} key: {e}", self.scheme.code_name()))
        })
    }
}

/// Threshold plus `NodeAndWeight` children; rebuilt through the key builder.
pub struct CompositeKeyCodec;

impl Serializer<CompositeKey> for CompositeKeyCodec {
    fn write(&self, session: &mut EncodeSession<'_>, key: &CompositeKey) -> SerializationResult<()> {
        let children = key.children();
        let count = u32::try_from(children.len())
            .map_err(|_| SerializationError::malformed("too many composite key children"))?;
        let out = session.output();
        out.write_u32_fixed(key.threshold());
        out.write_u32_fixed(count);
        for child in children {
            session.write_value(&Value::object(child.clone()))?;
        }
        Ok(())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<CompositeKey> {
        let threshold = session.input().read_u32_fixed()?;
        let children = session.read_list_of_length(2, None)?;
        let mut builder = CompositeKey::builder();
        for child in &children {
            let child = child.downcast::<NodeAndWeight>()?;
            builder = builder.add_key(child.node.clone(), child.weight);
        }
        builder
            .build(Some(threshold))
            .map_err(|e| constructor_failed(COMPOSITE_KEY, e))
    }
}

fn node_value(node: &KeyNode) -> Value {
    match node {
        KeyNode::Leaf(key) => Value::object(key.clone()),
        KeyNode::Composite(composite) => Value::from_arc(Arc::clone(composite)),
    }
}

fn node_from_value(value: &Value) -> SerializationResult<KeyNode> {
    if let Some(object) = value.as_object() {
        if let Some(key) = object.downcast_ref::<PublicKey>() {
            return Ok(KeyNode::Leaf(key.clone()));
        }
        if let Some(composite) = object.downcast::<CompositeKey>() {
            return Ok(KeyNode::Composite(composite));
        }
    }
    Err(SerializationError::unexpected(
        "public key or composite key",
        value.kind_name(),
    ))
}

pub(crate) fn register(r: &mut Registrar) -> SerializationResult<()> {
    r.register_override::<PublicKey, _>(PUBLIC_KEY, KeyCodec::new(SignatureScheme::Ed25519Sha512))?;
    r.register_override::<PrivateKey, _>(PRIVATE_KEY, KeyCodec::new(SignatureScheme::Ed25519Sha512))?;
    r.register_fn::<Signature, _, _>(
        SIGNATURE,
        |s, sig| s.output().write_blob(&sig.to_bytes()),
        |s| {
            let bytes = s.read_blob()?;
            Signature::from_slice(bytes).map_err(|e| SerializationError::malformed(format!("signature: {e}")))
        },
    )?;
    r.register_immutable(
        ImmutableSchema::new(SECURE_HASH)
            .field("bytes", FieldType::Object("byte[]"), |hash: &SecureHash| {
                Value::bytes(hash.as_bytes().to_vec())
            })
            .constructor(|args| {
                let bytes: Vec<u8> = args.cloned(0)?;
                SecureHash::from_slice(&bytes)
                    .ok_or_else(|| format!("hash must be 32 bytes, got {}", bytes.len()).into())
            }),
    )?;
    r.register_immutable(
        ImmutableSchema::new(NODE_AND_WEIGHT)
            .field("node", FieldType::Object("ledger.crypto.KeyNode"), |nw: &NodeAndWeight| {
                node_value(&nw.node)
            })
            .field("weight", FieldType::Int, |nw: &NodeAndWeight| Value::Int(nw.weight as i32))
            .constructor(|args| {
                let weight = args.int(1)?;
                let weight = u32::try_from(weight)
                    .map_err(|_| SerializationError::malformed(format!("negative weight {weight}")))?;
                Ok(NodeAndWeight {
                    node: node_from_value(args.get(0)?)?,
                    weight,
                })
            }),
    )?;
    r.register_override::<CompositeKey, _>(COMPOSITE_KEY, CompositeKeyCodec)?;

    for type_name in [PUBLIC_KEY, SIGNATURE, SECURE_HASH, NODE_AND_WEIGHT, COMPOSITE_KEY] {
        r.allow(type_name)?;
    }
    Ok(())
}
