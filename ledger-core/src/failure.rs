//! Recorded errors that travel between nodes.
//!
//! An [`ErrorRecord`] is the portable form of a failure raised in a flow or
//! RPC handler: a kind, a message, an optional cause and any errors that were
//! suppressed while handling it.

use std::fmt;
use std::sync::Arc;

/// Errors suppressed while handling a failure.
///
/// `NoneRecorded` is distinct from an empty list: it is the state of a fresh
/// record, and every empty collection normalizes to it.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Suppressed {
    /// Nothing has been suppressed.
    #[default]
    NoneRecorded,
    /// One or more suppressed errors, in the order they were added.
    Recorded(Vec<Arc<ErrorRecord>>),
}

impl Suppressed {
    /// Build from a list, mapping an empty list to `NoneRecorded`.
    pub fn from_vec(errors: Vec<Arc<ErrorRecord>>) -> Self {
        if errors.is_empty() {
            Suppressed::NoneRecorded
        } else {
            Suppressed::Recorded(errors)
        }
    }

    /// The suppressed errors as a slice.
    pub fn as_slice(&self) -> &[Arc<ErrorRecord>] {
        match self {
            Suppressed::NoneRecorded => &[],
            Suppressed::Recorded(errors) => errors,
        }
    }

    /// Whether nothing has been suppressed.
    pub fn is_none_recorded(&self) -> bool {
        matches!(self, Suppressed::NoneRecorded)
    }
}

/// A portable error value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    kind: String,
    message: Option<String>,
    cause: Option<Arc<ErrorRecord>>,
    suppressed: Suppressed,
}

impl ErrorRecord {
    /// Create a record with no cause and nothing suppressed.
    pub fn new(kind: impl Into<String>, message: Option<String>) -> Self {
        ErrorRecord {
            kind: kind.into(),
            message,
            cause: None,
            suppressed: Suppressed::NoneRecorded,
        }
    }

    /// Reassemble a record from all of its parts.
    pub fn from_parts(
        kind: String,
        message: Option<String>,
        cause: Option<Arc<ErrorRecord>>,
        suppressed: Suppressed,
    ) -> Self {
        let suppressed = match suppressed {
            Suppressed::Recorded(errors) => Suppressed::from_vec(errors),
            none => none,
        };
        ErrorRecord {
            kind,
            message,
            cause,
            suppressed,
        }
    }

    /// Capture a Rust error and its `source()` chain.
    pub fn from_error(kind: impl Into<String>, error: &(dyn std::error::Error + 'static)) -> Self {
        let cause = error
            .source()
            .map(|source| Arc::new(ErrorRecord::from_error("cause", source)));
        ErrorRecord {
            kind: kind.into(),
            message: Some(error.to_string()),
            cause,
            suppressed: Suppressed::NoneRecorded,
        }
    }

    /// Attach a cause.
    pub fn with_cause(mut self, cause: ErrorRecord) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Record an error suppressed while handling this one.
    pub fn add_suppressed(&mut self, error: ErrorRecord) {
        let error = Arc::new(error);
        match &mut self.suppressed {
            Suppressed::NoneRecorded => self.suppressed = Suppressed::Recorded(vec![error]),
            Suppressed::Recorded(errors) => errors.push(error),
        }
    }

    /// The error kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The cause, if any.
    pub fn cause(&self) -> Option<&Arc<ErrorRecord>> {
        self.cause.as_ref()
    }

    /// Suppressed errors.
    pub fn suppressed(&self) -> &Suppressed {
        &self.suppressed
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => f.write_str(&self.kind),
        }
    }
}

impl std::error::Error for ErrorRecord {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
