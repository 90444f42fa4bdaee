//! Singleton services that travel as a token name.
//!
//! A [`SerializeAsToken`] value is written as its token name only. Decoding
//! hands back the live instance registered under that name in the call's
//! [`TokenContext`], so a checkpointed flow reconnects to the running
//! service instead of receiving a copy.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::Codec;
use crate::descriptor::TypeName;
use crate::error::{SerializationError, SerializationResult};
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Object, Payload};

/// A singleton identified by a stable token name.
pub trait SerializeAsToken: Payload {
    /// Name the instance is registered under.
    fn token_name(&self) -> &str;
}

/// Live singletons available to one call, keyed by token name.
#[derive(Clone, Default)]
pub struct TokenContext {
    tokens: HashMap<String, Object>,
}

impl TokenContext {
    /// Context property the token context is stored under.
    pub const PROPERTY: &'static str = "ledger.serialization.tokens";

    /// Empty token context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `token` available under its token name, replacing any earlier one.
    pub fn insert<S: SerializeAsToken>(&mut self, token: Arc<S>) {
        let name = token.token_name().to_string();
        self.tokens.insert(name, Object::from_arc(token));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<S: SerializeAsToken>(mut self, token: Arc<S>) -> Self {
        self.insert(token);
        self
    }

    /// Instance registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Object> {
        self.tokens.get(name)
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are registered.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Debug for TokenContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.tokens.keys().collect();
        names.sort();
        f.debug_struct("TokenContext").field("tokens", &names).finish()
    }
}

struct TokenCodec<S> {
    _marker: PhantomData<fn() -> S>,
}

impl<S: SerializeAsToken> Codec for TokenCodec<S> {
    fn encode(&self, session: &mut EncodeSession<'_>, value: &Object) -> SerializationResult<()> {
        let token = value.downcast_ref::<S>().ok_or_else(|| {
            SerializationError::unexpected(std::any::type_name::<S>(), value.rust_type_name())
        })?;
        session.output().write_str(token.token_name())
    }

    fn decode(&self, session: &mut DecodeSession<'_>) -> SerializationResult<Object> {
        let name = session.read_string()?;
        let object = session
            .context()
            .tokens()
            .and_then(|tokens| tokens.get(&name))
            .ok_or_else(|| SerializationError::malformed(format!("no token registered as {name:?}")))?;
        if !object.is::<S>() {
            return Err(SerializationError::unexpected(
                std::any::type_name::<S>(),
                object.rust_type_name(),
            ));
        }
        Ok(object.clone())
    }
}

/// Register `S` to travel as its token name.
///
/// Like any other registration, `S` still needs [`Registrar::allow`] to
/// cross the network.
pub fn register_token<S: SerializeAsToken>(r: &mut Registrar, type_name: TypeName) -> SerializationResult<()> {
    r.register_codec::<S>(
        type_name,
        Arc::new(TokenCodec::<S> {
            _marker: PhantomData,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SerializationContext;
    use crate::engine::SerializationEngine;
    use crate::value::Value;

    const VAULT: TypeName = TypeName::new("demo.VaultService", 1);

    #[derive(Debug)]
    struct VaultService {
        states: usize,
    }

    impl SerializeAsToken for VaultService {
        fn token_name(&self) -> &str {
            "vault"
        }
    }

    fn engine() -> SerializationEngine {
        let engine = SerializationEngine::with_defaults().unwrap();
        engine
            .with_whitelist_disabled(|r| {
                register_token::<VaultService>(r, VAULT)?;
                r.allow(VAULT)
            })
            .unwrap();
        engine
    }

    #[test]
    fn test_decodes_to_live_instance() {
        let engine = engine();
        let vault = Arc::new(VaultService { states: 3 });
        let ctx = SerializationContext::internal_storage()
            .with_tokens(TokenContext::new().with(Arc::clone(&vault)));

        let bytes = engine.encode_arc(Arc::clone(&vault), &ctx).unwrap();
        let decoded = engine.decode::<VaultService>(bytes.bytes(), &ctx).unwrap();
        assert!(Arc::ptr_eq(&decoded, &vault));
        assert_eq!(decoded.states, 3);
    }

    #[test]
    fn test_token_written_by_name() {
        let engine = engine();
        let ctx = SerializationContext::external_network();
        let bytes = engine
            .encode_value(&Value::object(VaultService { states: 0 }), &ctx)
            .unwrap();
        let mut expected = vec![0x01, 17];
        expected.extend_from_slice(b"demo.VaultService");
        expected.extend_from_slice(&[0x01, 5]);
        expected.extend_from_slice(b"vault");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_missing_token_is_malformed() {
        let engine = engine();
        let vault = Arc::new(VaultService { states: 1 });
        let bare = SerializationContext::internal_storage();
        let bytes = engine.encode_arc(vault, &bare).unwrap();

        assert!(matches!(
            engine.decode::<VaultService>(bytes.bytes(), &bare),
            Err(SerializationError::MalformedStream(_))
        ));
        let empty = bare.with_tokens(TokenContext::new());
        assert!(matches!(
            engine.decode::<VaultService>(bytes.bytes(), &empty),
            Err(SerializationError::MalformedStream(_))
        ));
    }
}
