//! Specialized codecs and the default bootstrap.
//!
//! Each submodule owns the type names it registers and the order of the
//! fields it writes. Changing either changes the bytes that signatures are
//! taken over.

pub mod builtin;
pub mod certificates;
pub mod keys;
pub mod names;
pub mod stream;
pub mod throwable;
pub mod token;
pub mod transactions;

use crate::descriptor::TypeName;
use crate::error::{BoxError, SerializationError, SerializationResult};
use crate::registry::Registrar;

/// Register every built-in and ledger codec.
pub(crate) fn register_defaults(r: &mut Registrar) -> SerializationResult<()> {
    builtin::register(r)?;
    stream::register(r)?;
    names::register(r)?;
    throwable::register(r)?;
    keys::register(r)?;
    certificates::register(r)?;
    transactions::register(r)?;
    tracing::debug!(whitelisted = r.whitelist().len(), "registered default codecs");
    Ok(())
}

/// A value read from the stream was rejected by the type's own validation.
pub(crate) fn constructor_failed(type_name: TypeName, source: impl Into<BoxError>) -> SerializationError {
    SerializationError::ConstructorInvocation {
        type_name: type_name.to_string(),
        source: source.into(),
    }
}
