//! Engine facade: registration window plus the encode and decode entry points.

use std::any::{Any, TypeId};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use ledger_core::SerializedBytes;

use crate::codecs;
use crate::config::EngineConfig;
use crate::context::SerializationContext;
use crate::descriptor::{TypeDescriptor, TypeName};
use crate::error::{SerializationError, SerializationResult};
use crate::registry::{Registrar, RegistryTable};
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Object, Payload, Value};
use crate::whitelist::{Whitelist, WhitelistMode};

/// The serialization engine.
///
/// Registrations are published as immutable snapshots. Encode and decode
/// calls load the current snapshot without locking; registration windows are
/// serialized by a mutex and publish atomically when they succeed.
pub struct SerializationEngine {
    config: EngineConfig,
    table: ArcSwap<RegistryTable>,
    bootstrap: Mutex<()>,
}

impl SerializationEngine {
    /// Create an engine with nothing registered.
    pub fn new(config: EngineConfig) -> SerializationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: ArcSwap::from_pointee(RegistryTable::default()),
            bootstrap: Mutex::new(()),
        })
    }

    /// Create an engine with the built-in and ledger codecs registered.
    pub fn with_defaults() -> SerializationResult<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given limits and the default registrations.
    pub fn with_config(config: EngineConfig) -> SerializationResult<Self> {
        let engine = Self::new(config)?;
        engine.with_whitelist_disabled(codecs::register_defaults)?;
        Ok(engine)
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a registration window.
    ///
    /// The closure works on a private copy of the registry. If it succeeds the
    /// copy replaces the published registry in one step; if it fails nothing
    /// is published. Concurrent calls keep using the snapshot they loaded.
    pub fn with_whitelist_disabled<R, F>(&self, register: F) -> SerializationResult<R>
    where
        F: FnOnce(&mut Registrar) -> SerializationResult<R>,
    {
        let _guard = self
            .bootstrap
            .lock()
            .map_err(|_| SerializationError::Registration("registration lock poisoned".to_string()))?;
        let current = self.table.load_full();
        let mut registrar = Registrar::new(RegistryTable::clone(&current));
        let result = register(&mut registrar)?;
        self.table.store(Arc::new(registrar.into_table()));
        Ok(result)
    }

    /// Whether a type may be decoded in `mode`.
    pub fn is_permitted(&self, type_name: &TypeName, mode: WhitelistMode) -> bool {
        self.table.load().is_permitted(type_name, mode)
    }

    /// Snapshot of the network whitelist.
    pub fn whitelist(&self) -> Whitelist {
        self.table.load().whitelist().clone()
    }

    /// Type name registered for `T`.
    pub fn type_name_of<T: Any>(&self) -> Option<TypeName> {
        self.table.load().by_type(TypeId::of::<T>()).map(|r| r.type_name)
    }

    /// Constructor shape of a generically encoded `T`.
    pub fn descriptor_of<T: Any>(&self) -> Option<Arc<TypeDescriptor>> {
        self.table
            .load()
            .by_type(TypeId::of::<T>())
            .and_then(|r| r.codec.descriptor())
    }

    /// Encode a copy of `value`.
    pub fn encode<T: Payload + Clone>(
        &self,
        value: &T,
        ctx: &SerializationContext,
    ) -> SerializationResult<SerializedBytes<T>> {
        self.encode_object(&Object::new(value.clone()), ctx)
            .map(SerializedBytes::new)
    }

    /// Encode a shared value; identity-equal parts of it are written once.
    pub fn encode_arc<T: Payload>(
        &self,
        value: Arc<T>,
        ctx: &SerializationContext,
    ) -> SerializationResult<SerializedBytes<T>> {
        self.encode_object(&Object::from_arc(value), ctx)
            .map(SerializedBytes::new)
    }

    /// Encode any value, including null and boxed primitives.
    pub fn encode_value(&self, value: &Value, ctx: &SerializationContext) -> SerializationResult<Vec<u8>> {
        let table = self.table.load_full();
        let mut session = EncodeSession::new(&table, ctx, &self.config);
        session.write_value(value)?;
        Ok(session.into_bytes())
    }

    fn encode_object(&self, object: &Object, ctx: &SerializationContext) -> SerializationResult<Vec<u8>> {
        let table = self.table.load_full();
        let mut session = EncodeSession::new(&table, ctx, &self.config);
        session.write_object(object)?;
        Ok(session.into_bytes())
    }

    /// Decode a `T`. The stream's top-level type is checked before its body is read.
    pub fn decode<T: Any + Send + Sync>(
        &self,
        bytes: &[u8],
        ctx: &SerializationContext,
    ) -> SerializationResult<Arc<T>> {
        let table = self.table.load_full();
        let mut session = DecodeSession::new(bytes, &table, ctx, &self.config);
        session.expect_root::<T>();
        let value = session.read_value()?;
        session.finish()?;
        value.downcast::<T>()
    }

    /// Decode whatever non-null object the stream holds.
    pub fn decode_object(&self, bytes: &[u8], ctx: &SerializationContext) -> SerializationResult<Object> {
        match self.decode_value(bytes, ctx)? {
            Value::Object(object) => Ok(object),
            other => Err(SerializationError::unexpected("object", other.kind_name())),
        }
    }

    /// Decode any value, including null.
    pub fn decode_value(&self, bytes: &[u8], ctx: &SerializationContext) -> SerializationResult<Value> {
        let table = self.table.load_full();
        let mut session = DecodeSession::new(bytes, &table, ctx, &self.config);
        let value = session.read_value()?;
        session.finish()?;
        Ok(value)
    }

    /// Type name at the head of an encoded stream, if it starts with a new object.
    pub fn peek_type_name(&self, bytes: &[u8]) -> Option<(String, u32)> {
        let mut input = crate::primitives::Input::new(bytes);
        if input.read_var_u32().ok()? != crate::references::NEW_MARKER {
            return None;
        }
        let name = input.read_str(crate::session::MAX_TYPE_NAME_LEN).ok()?.to_string();
        let version = input.read_var_u32().ok()?;
        Some((name, version))
    }
}

impl std::fmt::Debug for SerializationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationEngine")
            .field("config", &self.config)
            .field("whitelisted", &self.table.load().whitelist().len())
            .finish()
    }
}

/// Decoding for [`SerializedBytes`].
pub trait DeserializeBytes<T> {
    /// Decode the wrapped bytes as a `T`.
    fn deserialize(
        &self,
        engine: &SerializationEngine,
        ctx: &SerializationContext,
    ) -> SerializationResult<Arc<T>>;
}

impl<T: Any + Send + Sync> DeserializeBytes<T> for SerializedBytes<T> {
    fn deserialize(
        &self,
        engine: &SerializationEngine,
        ctx: &SerializationContext,
    ) -> SerializationResult<Arc<T>> {
        engine.decode::<T>(self.bytes(), ctx)
    }
}
