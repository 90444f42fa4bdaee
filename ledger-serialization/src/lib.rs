//! Object serialization for the ledger.
//!
//! This crate turns registered immutable values into a compact binary stream
//! and back, defending against hostile or stale input:
//! - Closed registry of versioned type names; unknown names are rejected
//! - Network whitelist, enforced under the external-network context
//! - Constructor-based codec for immutable types, guarded by a shape fingerprint
//! - Specialized codecs for keys, certificates, names, errors and streams
//! - Per-call reference tracking, disabled inside hash-stable types
//!
//! # Example
//!
//! ```ignore
//! use ledger_serialization::{SerializationContext, SerializationEngine};
//! use ledger_core::StateRef;
//!
//! let engine = SerializationEngine::with_defaults()?;
//! let ctx = SerializationContext::external_network();
//! let bytes = engine.encode(&state_ref, &ctx)?;
//! let decoded = engine.decode::<StateRef>(bytes.bytes(), &ctx)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
pub mod codecs;
mod config;
mod context;
mod descriptor;
mod engine;
mod error;
mod generic;
mod primitives;
mod references;
mod registry;
mod session;
mod value;
mod whitelist;

pub use codec::{Codec, FnSerializer, Serializer};
pub use codecs::keys::KeyCodec;
pub use codecs::names::{ClassRef, LoggerHandle};
pub use codecs::stream::InputStream;
pub use codecs::token::{register_token, SerializeAsToken, TokenContext};
pub use config::{
    EngineConfig, DEFAULT_MAX_BLOB_LEN, DEFAULT_MAX_COLLECTION_LEN, DEFAULT_MAX_DEPTH,
    DEFAULT_STREAM_CHUNK_SIZE,
};
pub use context::{SerializationContext, TypeResolver};
pub use descriptor::{fingerprint, FieldType, ParamDescriptor, TypeDescriptor, TypeName};
pub use engine::{DeserializeBytes, SerializationEngine};
pub use error::{BoxError, SerializationError, SerializationResult};
pub use generic::{Args, ImmutableSchema};
pub use primitives::{Input, Output};
pub use references::{NEW_MARKER, NULL_MARKER, REF_BASE};
pub use registry::Registrar;
pub use session::{DecodeSession, EncodeSession, MAX_TYPE_NAME_LEN};
pub use value::{Object, Payload, Value, ValueMap};
pub use whitelist::{Whitelist, WhitelistMode};
