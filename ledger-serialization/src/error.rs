//! Serialization error types.

use thiserror::Error;

use crate::whitelist::WhitelistMode;

/// A boxed error raised by application code, such as a registered constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for engine operations.
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Errors that can occur while encoding or decoding.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The stream names a type that is unknown or not permitted in this mode.
    #[error("type `{type_name}` is not permitted in {mode} mode")]
    SecurityViolation {
        /// Type name as it appeared in the stream or value.
        type_name: String,
        /// Whitelist mode of the call.
        mode: WhitelistMode,
    },

    /// Field count in the stream differs from the registered arity.
    #[error("type `{type_name}` expects {expected} fields but stream has {actual}")]
    SchemaMismatch {
        /// Registered type name.
        type_name: String,
        /// Registered constructor arity.
        expected: u32,
        /// Field count read from the stream.
        actual: u32,
    },

    /// Stream was written by an incompatible shape of the type.
    #[error("type `{type_name}` fingerprint mismatch: expected {expected:08x}, stream has {actual:08x}")]
    TypeEvolution {
        /// Registered type name.
        type_name: String,
        /// Fingerprint of the registered shape.
        expected: u32,
        /// Fingerprint read from the stream.
        actual: u32,
    },

    /// Stream names a known type at a version this process does not have.
    #[error("type `{type_name}` is registered at version {expected}, stream has version {actual}")]
    VersionMismatch {
        /// Registered type name.
        type_name: String,
        /// Registered version.
        expected: u32,
        /// Version read from the stream.
        actual: u32,
    },

    /// A registered constructor rejected its arguments.
    #[error("constructor of `{type_name}` failed: {source}")]
    ConstructorInvocation {
        /// Type whose constructor failed.
        type_name: String,
        /// The error raised by the constructor.
        source: BoxError,
    },

    /// Structurally invalid stream content.
    #[error("malformed stream: {0}")]
    MalformedStream(String),

    /// An object refers back to itself where references cannot be restored.
    #[error("reference cycle through `{type_name}`")]
    ReferenceCycle {
        /// Type at which the cycle was detected.
        type_name: String,
    },

    /// A value was not of the type its position requires.
    #[error("expected {expected}, found {actual}")]
    UnexpectedType {
        /// Required type.
        expected: String,
        /// Type actually present.
        actual: String,
    },

    /// Object nesting exceeded the configured depth.
    #[error("object nesting exceeds depth limit {limit}")]
    DepthLimitExceeded {
        /// Configured maximum depth.
        limit: usize,
    },

    /// A declared length exceeded its configured limit.
    #[error("{what} length {len} exceeds limit {max}")]
    LimitExceeded {
        /// What was being read.
        what: &'static str,
        /// Declared length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A key does not use the scheme its codec was built for.
    #[error("key scheme {actual} does not match expected {expected}")]
    KeyParameterMismatch {
        /// Scheme the codec expects.
        expected: &'static str,
        /// Scheme of the key being encoded.
        actual: &'static str,
    },

    /// A Rust type has no registration.
    #[error("no codec registered for {0}")]
    NotRegistered(String),

    /// Registration was rejected.
    #[error("registration rejected: {0}")]
    Registration(String),

    /// Input ended before a value was complete.
    #[error("unexpected end of stream: needed {needed} more bytes")]
    UnexpectedEof {
        /// Bytes missing.
        needed: usize,
    },

    /// Input remained after the top-level value.
    #[error("{remaining} trailing bytes after top-level value")]
    TrailingBytes {
        /// Unread byte count.
        remaining: usize,
    },

    /// Engine configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error while draining a byte stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerializationError {
    /// Whether this rejection came from untrusted or stale input rather than a local bug.
    ///
    /// Transport code drops messages that fail this way instead of treating them as fatal.
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self,
            SerializationError::SecurityViolation { .. }
                | SerializationError::SchemaMismatch { .. }
                | SerializationError::TypeEvolution { .. }
                | SerializationError::VersionMismatch { .. }
                | SerializationError::MalformedStream(_)
                | SerializationError::ReferenceCycle { .. }
                | SerializationError::DepthLimitExceeded { .. }
                | SerializationError::LimitExceeded { .. }
                | SerializationError::UnexpectedEof { .. }
                | SerializationError::TrailingBytes { .. }
        )
    }

    /// The constructor's original error, if this is a constructor failure of type `E`.
    pub fn constructor_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            SerializationError::ConstructorInvocation { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub(crate) fn unexpected(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        SerializationError::UnexpectedType {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        SerializationError::MalformedStream(detail.into())
    }
}
