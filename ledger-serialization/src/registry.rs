//! Closed registry of codecs, keyed by type name and by Rust type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{Codec, FnSerializer, Serializer, Typed};
use crate::descriptor::{TypeDescriptor, TypeName};
use crate::error::{SerializationError, SerializationResult};
use crate::generic::ImmutableSchema;
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Object, Payload};
use crate::whitelist::{Whitelist, WhitelistMode};

/// Everything the engine knows about one registered type.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) type_name: TypeName,
    pub(crate) type_id: TypeId,
    pub(crate) rust_name: &'static str,
    pub(crate) codec: Arc<dyn Codec>,
    pub(crate) no_references: bool,
}

/// Immutable snapshot of all registrations and the network whitelist.
#[derive(Clone, Default)]
pub(crate) struct RegistryTable {
    by_name: HashMap<&'static str, Arc<Registration>>,
    by_type: HashMap<TypeId, Arc<Registration>>,
    whitelist: Whitelist,
}

impl RegistryTable {
    pub(crate) fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub(crate) fn by_type(&self, type_id: TypeId) -> Option<&Arc<Registration>> {
        self.by_type.get(&type_id)
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<&Arc<Registration>> {
        self.by_name.get(name)
    }

    pub(crate) fn is_permitted(&self, type_name: &TypeName, mode: WhitelistMode) -> bool {
        match self.by_name.get(type_name.name()) {
            Some(registration) if registration.type_name == *type_name => {
                self.whitelist.permits(type_name, mode)
            }
            _ => false,
        }
    }

    /// Registration for an object about to be written.
    pub(crate) fn for_encode(
        &self,
        object: &Object,
        mode: WhitelistMode,
    ) -> SerializationResult<&Arc<Registration>> {
        let registration = self
            .by_type(object.payload_type_id())
            .ok_or_else(|| SerializationError::NotRegistered(object.rust_type_name().to_string()))?;
        if !self.whitelist.permits(&registration.type_name, mode) {
            tracing::warn!(
                type_name = %registration.type_name,
                %mode,
                "refusing to encode type outside the whitelist"
            );
            return Err(SerializationError::SecurityViolation {
                type_name: registration.type_name.to_string(),
                mode,
            });
        }
        Ok(registration)
    }

    /// Registration for a type name read from a stream.
    ///
    /// Checked against the whitelist before any codec for it runs.
    pub(crate) fn for_decode(
        &self,
        name: &str,
        version: u32,
        mode: WhitelistMode,
    ) -> SerializationResult<&Arc<Registration>> {
        let Some(registration) = self.by_name(name) else {
            tracing::warn!(type_name = name, %mode, "rejecting unknown type in stream");
            return Err(SerializationError::SecurityViolation {
                type_name: name.to_string(),
                mode,
            });
        };
        if !self.whitelist.permits(&registration.type_name, mode) {
            tracing::warn!(
                type_name = %registration.type_name,
                %mode,
                "rejecting type outside the whitelist"
            );
            return Err(SerializationError::SecurityViolation {
                type_name: registration.type_name.to_string(),
                mode,
            });
        }
        if registration.type_name.version() != version {
            return Err(SerializationError::VersionMismatch {
                type_name: name.to_string(),
                expected: registration.type_name.version(),
                actual: version,
            });
        }
        Ok(registration)
    }
}

/// Mutable view of the registry, handed out only inside
/// [`SerializationEngine::with_whitelist_disabled`](crate::SerializationEngine::with_whitelist_disabled).
pub struct Registrar {
    table: RegistryTable,
}

impl Registrar {
    pub(crate) fn new(table: RegistryTable) -> Self {
        Self { table }
    }

    pub(crate) fn into_table(self) -> RegistryTable {
        self.table
    }

    /// Register a type for constructor-based encoding.
    ///
    /// The schema is validated here; a type that fails validation is never
    /// registered.
    pub fn register_immutable<T: Payload>(
        &mut self,
        schema: ImmutableSchema<T>,
    ) -> SerializationResult<Arc<TypeDescriptor>> {
        let codec = schema.build()?;
        let descriptor = codec.descriptor_arc();
        self.insert::<T>(descriptor.type_name(), Arc::new(Typed::new(codec)))?;
        Ok(descriptor)
    }

    /// Install a hand-written serializer, replacing any earlier codec for `T`.
    pub fn register_override<T, S>(&mut self, type_name: TypeName, serializer: S) -> SerializationResult<()>
    where
        T: Payload,
        S: Serializer<T> + 'static,
    {
        self.insert::<T>(type_name, Arc::new(Typed::new(serializer)))
    }

    /// Install a serializer built from a writer and a reader closure.
    pub fn register_fn<T, W, R>(&mut self, type_name: TypeName, write: W, read: R) -> SerializationResult<()>
    where
        T: Payload,
        W: Fn(&mut EncodeSession<'_>, &T) -> SerializationResult<()> + Send + Sync + 'static,
        R: Fn(&mut DecodeSession<'_>) -> SerializationResult<T> + Send + Sync + 'static,
    {
        self.register_override::<T, _>(type_name, FnSerializer::new(write, read))
    }

    /// Install a type-erased codec for `T`.
    pub fn register_codec<T: Payload>(
        &mut self,
        type_name: TypeName,
        codec: Arc<dyn Codec>,
    ) -> SerializationResult<()> {
        self.insert::<T>(type_name, codec)
    }

    /// Permit a registered type on the network.
    pub fn allow(&mut self, type_name: TypeName) -> SerializationResult<()> {
        match self.table.by_name.get(type_name.name()) {
            Some(registration) if registration.type_name == type_name => {
                if self.table.whitelist.insert(type_name) {
                    tracing::debug!(type_name = %type_name, "whitelisted");
                }
                Ok(())
            }
            _ => Err(SerializationError::Registration(format!(
                "cannot whitelist unregistered type {type_name}"
            ))),
        }
    }

    /// Permit the registered type `T` on the network.
    pub fn allow_type<T: Any>(&mut self) -> SerializationResult<TypeName> {
        let type_name = self.registration_of::<T>()?.type_name;
        self.allow(type_name)?;
        Ok(type_name)
    }

    /// Disable reference tracking inside `T`'s body, making its bytes a pure
    /// function of its content.
    pub fn no_references_within<T: Any>(&mut self) -> SerializationResult<()> {
        let mut registration = Registration::clone(&*self.registration_of::<T>()?);
        registration.no_references = true;
        tracing::debug!(type_name = %registration.type_name, "reference tracking disabled within type");
        self.publish(Arc::new(registration));
        Ok(())
    }

    /// The network whitelist as built so far.
    pub fn whitelist(&self) -> &Whitelist {
        &self.table.whitelist
    }

    /// Whether a type name is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.table.by_name.contains_key(name)
    }

    /// Type name registered for `T`.
    pub fn type_name_of<T: Any>(&self) -> Option<TypeName> {
        self.table.by_type(TypeId::of::<T>()).map(|r| r.type_name)
    }

    fn registration_of<T: Any>(&self) -> SerializationResult<Arc<Registration>> {
        self.table.by_type(TypeId::of::<T>()).cloned().ok_or_else(|| {
            SerializationError::Registration(format!(
                "{} is not registered",
                std::any::type_name::<T>()
            ))
        })
    }

    fn insert<T: Payload>(&mut self, type_name: TypeName, codec: Arc<dyn Codec>) -> SerializationResult<()> {
        let type_id = TypeId::of::<T>();
        let rust_name = std::any::type_name::<T>();
        let name = type_name.name();
        if name.is_empty() || name.len() > crate::session::MAX_TYPE_NAME_LEN {
            return Err(SerializationError::Registration(format!(
                "type name for {rust_name} must be 1..={} bytes",
                crate::session::MAX_TYPE_NAME_LEN
            )));
        }
        if let Some(existing) = self.table.by_name.get(name) {
            if existing.type_id != type_id {
                return Err(SerializationError::Registration(format!(
                    "{name} is already registered for {}",
                    existing.rust_name
                )));
            }
        }
        let existing = self.table.by_type(type_id).cloned();
        if let Some(existing) = &existing {
            if existing.type_name != type_name {
                return Err(SerializationError::Registration(format!(
                    "{rust_name} is already registered as {}",
                    existing.type_name
                )));
            }
        }

        let registration = Registration {
            type_name,
            type_id,
            rust_name,
            codec,
            no_references: existing.map_or(false, |r| r.no_references),
        };
        tracing::debug!(type_name = %type_name, rust_type = rust_name, "registered codec");
        self.publish(Arc::new(registration));
        Ok(())
    }

    fn publish(&mut self, registration: Arc<Registration>) {
        self.table
            .by_name
            .insert(registration.type_name.name(), Arc::clone(&registration));
        self.table.by_type.insert(registration.type_id, registration);
    }
}
