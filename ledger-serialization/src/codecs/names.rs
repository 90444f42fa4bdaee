//! Values that travel by name: class references, logger handles and X.500 names.
//!
//! Class references and logger handles are re-resolved on decode, through the
//! context's [`TypeResolver`](crate::TypeResolver) when one is installed.

use std::fmt;

use ledger_core::X500Name;

use super::constructor_failed;
use crate::codec::Serializer;
use crate::descriptor::TypeName;
use crate::error::{SerializationError, SerializationResult};
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};

/// Reference to a registered type.
pub const CLASS_REF: TypeName = TypeName::new("builtin.ClassRef", 1);
/// Logger handle.
pub const LOGGER: TypeName = TypeName::new("builtin.Logger", 1);
/// X.500 distinguished name.
pub const X500_NAME: TypeName = TypeName::new("ledger.identity.X500Name", 1);

/// A reference to a type by its stable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRef {
    name: String,
}

impl ClassRef {
    /// Reference a type by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Reference a registered type.
    pub fn of(type_name: TypeName) -> Self {
        Self::new(type_name.name())
    }

    /// The referenced name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A named logger. Events it emits carry its name as the `logger` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoggerHandle {
    name: String,
}

impl LoggerHandle {
    /// Handle for the logger called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emit a debug event.
    pub fn debug(&self, message: &str) {
        tracing::debug!(logger = %self.name, "{}", message);
    }

    /// Emit an info event.
    pub fn info(&self, message: &str) {
        tracing::info!(logger = %self.name, "{}", message);
    }

    /// Emit a warning.
    pub fn warn(&self, message: &str) {
        tracing::warn!(logger = %self.name, "{}", message);
    }
}

fn rejected(session: &DecodeSession<'_>, name: &str) -> SerializationError {
    let mode = session.context().mode();
    tracing::warn!(type_name = %name, %mode, "rejected name reference");
    SerializationError::SecurityViolation {
        type_name: name.to_string(),
        mode,
    }
}

struct ClassRefCodec;

impl Serializer<ClassRef> for ClassRefCodec {
    fn write(&self, session: &mut EncodeSession<'_>, class: &ClassRef) -> SerializationResult<()> {
        session.output().write_str(class.name())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<ClassRef> {
        let name = session.read_string()?;
        let resolved = match session.context().resolver() {
            Some(resolver) => resolver.resolve_class(&name),
            None => {
                let table = session.registry();
                table
                    .by_name(&name)
                    .filter(|r| table.is_permitted(&r.type_name, session.context().mode()))
                    .map(|r| ClassRef::of(r.type_name))
            }
        };
        resolved.ok_or_else(|| rejected(session, &name))
    }
}

struct LoggerCodec;

impl Serializer<LoggerHandle> for LoggerCodec {
    fn write(&self, session: &mut EncodeSession<'_>, logger: &LoggerHandle) -> SerializationResult<()> {
        session.output().write_str(logger.name())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<LoggerHandle> {
        let name = session.read_string()?;
        let resolved = match session.context().resolver() {
            Some(resolver) => resolver.resolve_logger(&name),
            None => Some(LoggerHandle::new(name.as_str())),
        };
        resolved.ok_or_else(|| rejected(session, &name))
    }
}

struct X500NameCodec;

impl Serializer<X500Name> for X500NameCodec {
    fn write(&self, session: &mut EncodeSession<'_>, name: &X500Name) -> SerializationResult<()> {
        session.output().write_str(&name.canonical())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<X500Name> {
        let text = session.read_string()?;
        X500Name::parse(&text).map_err(|e| constructor_failed(X500_NAME, e))
    }
}

pub(crate) fn register(r: &mut Registrar) -> SerializationResult<()> {
    r.register_override::<ClassRef, _>(CLASS_REF, ClassRefCodec)?;
    r.register_override::<LoggerHandle, _>(LOGGER, LoggerCodec)?;
    r.register_override::<X500Name, _>(X500_NAME, X500NameCodec)?;
    for type_name in [CLASS_REF, LOGGER, X500_NAME] {
        r.allow(type_name)?;
    }
    Ok(())
}
