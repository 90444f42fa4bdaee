//! Per-call serialization context.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::codecs::names::{ClassRef, LoggerHandle};
use crate::codecs::token::TokenContext;
use crate::whitelist::WhitelistMode;

/// Resolves names read from a stream back into live handles.
///
/// Installed on a context to override how class references and logger
/// handles are re-resolved, for example when decoding under an
/// application-specific set of names.
pub trait TypeResolver: Send + Sync + fmt::Debug {
    /// Resolve a class reference. `None` rejects the name.
    fn resolve_class(&self, name: &str) -> Option<ClassRef>;

    /// Resolve a logger handle. `None` rejects the name.
    fn resolve_logger(&self, name: &str) -> Option<LoggerHandle> {
        Some(LoggerHandle::new(name))
    }
}

/// Whitelist mode, resolver override and session properties for one call.
///
/// Contexts are immutable once built and borrowed by each call, so nothing
/// a call does can leak into the next one.
#[derive(Clone)]
pub struct SerializationContext {
    mode: WhitelistMode,
    resolver: Option<Arc<dyn TypeResolver>>,
    properties: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl SerializationContext {
    /// Context with a given whitelist mode and nothing else.
    pub fn new(mode: WhitelistMode) -> Self {
        Self {
            mode,
            resolver: None,
            properties: HashMap::new(),
        }
    }

    /// Context for bytes exchanged with peers.
    pub fn external_network() -> Self {
        Self::new(WhitelistMode::ExternalNetwork)
    }

    /// Context for trusted local storage.
    pub fn internal_storage() -> Self {
        Self::new(WhitelistMode::InternalStorage)
    }

    /// Install a resolver override.
    pub fn with_resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Attach a session property.
    pub fn with_property<T: Any + Send + Sync>(mut self, key: &'static str, value: T) -> Self {
        self.properties.insert(key, Arc::new(value));
        self
    }

    /// Attach the tokens singleton objects resolve against.
    pub fn with_tokens(self, tokens: TokenContext) -> Self {
        self.with_property(TokenContext::PROPERTY, tokens)
    }

    /// The whitelist mode.
    pub fn mode(&self) -> WhitelistMode {
        self.mode
    }

    /// The resolver override, if any.
    pub fn resolver(&self) -> Option<&Arc<dyn TypeResolver>> {
        self.resolver.as_ref()
    }

    /// A session property of type `T`.
    pub fn property<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.properties.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// The token context, if one was attached.
    pub fn tokens(&self) -> Option<&TokenContext> {
        self.property(TokenContext::PROPERTY)
    }
}

impl fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&&str> = self.properties.keys().collect();
        keys.sort();
        f.debug_struct("SerializationContext")
            .field("mode", &self.mode)
            .field("resolver", &self.resolver)
            .field("properties", &keys)
            .finish()
    }
}
