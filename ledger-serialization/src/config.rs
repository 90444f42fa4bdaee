//! Engine configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{SerializationError, SerializationResult};

/// Default maximum object nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default maximum element count of a list, map or composite key.
pub const DEFAULT_MAX_COLLECTION_LEN: usize = 1 << 20;

/// Default maximum length of a blob or stream chunk (16 MiB).
pub const DEFAULT_MAX_BLOB_LEN: usize = 16 * 1024 * 1024;

/// Default chunk size when draining byte streams.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 4096;

/// Limits and behaviour of a [`SerializationEngine`](crate::SerializationEngine).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum nesting of objects on encode and decode.
    pub max_depth: usize,

    /// Maximum declared element count of a collection.
    pub max_collection_len: usize,

    /// Maximum declared length of a blob or stream chunk.
    pub max_blob_len: usize,

    /// Chunk size used when draining byte streams.
    pub stream_chunk_size: usize,

    /// Fail top-level decodes that leave input unread.
    pub reject_trailing_bytes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
            max_blob_len: DEFAULT_MAX_BLOB_LEN,
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            reject_trailing_bytes: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> SerializationResult<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| SerializationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> SerializationResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject limits that would make every call fail.
    pub fn validate(&self) -> SerializationResult<()> {
        let limits = [
            ("max_depth", self.max_depth),
            ("max_collection_len", self.max_collection_len),
            ("max_blob_len", self.max_blob_len),
            ("stream_chunk_size", self.stream_chunk_size),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(SerializationError::Config(format!("{name} must be non-zero")));
            }
        }
        if self.stream_chunk_size > self.max_blob_len {
            return Err(SerializationError::Config(format!(
                "stream_chunk_size {} exceeds max_blob_len {}",
                self.stream_chunk_size, self.max_blob_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.max_blob_len, 16 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("max_depth = 32\n").unwrap();
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.stream_chunk_size, DEFAULT_STREAM_CHUNK_SIZE);
        assert!(config.reject_trailing_bytes);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = EngineConfig::from_toml_str("max_collection_len = 0\n");
        assert!(matches!(result, Err(SerializationError::Config(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = EngineConfig::from_toml_str("max_dept = 3\n");
        assert!(matches!(result, Err(SerializationError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stream_chunk_size = 512").unwrap();
        writeln!(file, "reject_trailing_bytes = false").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.stream_chunk_size, 512);
        assert!(!config.reject_trailing_bytes);
    }
}
