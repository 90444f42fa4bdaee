//! Input loading and decoding.

use std::fmt;

use anyhow::Context;
use ledger_serialization::{
    EngineConfig, SerializationContext, SerializationEngine, SerializationError, Value,
};

use crate::cli::Cli;

/// What a successfully decoded stream holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Type name and version at the head of the stream, absent for null and back-references.
    pub head: Option<(String, u32)>,
    /// Encoded size in bytes.
    pub size: usize,
    /// `Debug` rendering of the decoded value.
    pub rendering: String,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.head {
            Some((name, version)) => writeln!(f, "type: {name} (version {version})")?,
            None => writeln!(f, "type: -")?,
        }
        writeln!(f, "size: {} bytes", self.size)?;
        write!(f, "{}", self.rendering)
    }
}

/// Read the stream named on the command line.
pub fn load_input(cli: &Cli) -> anyhow::Result<Vec<u8>> {
    if cli.file {
        return std::fs::read(&cli.input).with_context(|| format!("failed to read {}", cli.input));
    }
    decode_hex(&cli.input)
}

/// Parse hex text, tolerating whitespace and a `0x` prefix.
pub fn decode_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix("0x").unwrap_or(&compact);
    hex::decode(digits).context("input is not valid hex")
}

/// Build the engine configuration from `--config` and flag overrides.
pub fn engine_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(max_blob_len) = cli.max_blob_len {
        config.max_blob_len = max_blob_len;
    }
    if let Some(stream_chunk_size) = cli.stream_chunk_size {
        config.stream_chunk_size = stream_chunk_size;
    }
    if cli.allow_trailing {
        config.reject_trailing_bytes = false;
    }
    config.validate()?;
    Ok(config)
}

/// Decode `bytes` under `ctx`.
pub fn inspect(
    engine: &SerializationEngine,
    bytes: &[u8],
    ctx: &SerializationContext,
) -> Result<Report, SerializationError> {
    let value = engine.decode_value(bytes, ctx)?;
    let rendering = match &value {
        Value::Null => "null".to_string(),
        Value::Object(object) => format!("{object:#?}"),
        primitive => format!("{primitive:?}"),
    };
    Ok(Report {
        head: engine.peek_type_name(bytes),
        size: bytes.len(),
        rendering,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use ledger_core::crypto::sha256;
    use ledger_core::StateRef;
    use std::io::Write;

    #[test]
    fn test_decode_hex_forms() {
        assert_eq!(decode_hex("0x01 02\n0a").unwrap(), vec![1, 2, 10]);
        assert!(decode_hex("zz").is_err());
    }

    #[test]
    fn test_config_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_depth = 16").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::parse_from(["ledger-inspect", "00", "--config", &path, "--max-blob-len", "8192"]);
        let config = engine_config(&cli).unwrap();
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.max_blob_len, 8192);
        assert_eq!(config.stream_chunk_size, 4096);

        let cli = Cli::parse_from(["ledger-inspect", "00", "--max-depth", "0"]);
        assert!(engine_config(&cli).is_err());
    }

    #[test]
    fn test_blob_limit_below_chunk_size_rejected() {
        let cli = Cli::parse_from(["ledger-inspect", "00", "--max-blob-len", "1024"]);
        let err = engine_config(&cli).unwrap_err();
        assert!(err.to_string().contains("stream_chunk_size 4096 exceeds max_blob_len 1024"));

        let cli = Cli::parse_from([
            "ledger-inspect",
            "00",
            "--max-blob-len",
            "1024",
            "--stream-chunk-size",
            "512",
        ]);
        let config = engine_config(&cli).unwrap();
        assert_eq!(config.max_blob_len, 1024);
        assert_eq!(config.stream_chunk_size, 512);
    }

    #[test]
    fn test_inspect_reports_type() {
        let engine = SerializationEngine::with_defaults().unwrap();
        let ctx = SerializationContext::external_network();
        let state = StateRef::new(sha256(b"tx"), 3);
        let bytes = engine.encode(&state, &ctx).unwrap();

        let report = inspect(&engine, bytes.bytes(), &ctx).unwrap();
        let (name, version) = report.head.clone().unwrap();
        assert_eq!(name, "ledger.transactions.StateRef");
        assert_eq!(version, 1);
        assert!(report.to_string().contains("StateRef"));
    }

    #[test]
    fn test_inspect_null() {
        let engine = SerializationEngine::with_defaults().unwrap();
        let report = inspect(&engine, &[0x00], &SerializationContext::external_network()).unwrap();
        assert_eq!(report.head, None);
        assert_eq!(report.rendering, "null");
    }

    #[test]
    fn test_inspect_rejects_unknown_type() {
        let engine = SerializationEngine::with_defaults().unwrap();
        let mut bytes = vec![0x01, 11];
        bytes.extend_from_slice(b"evil.Gadget");
        bytes.push(0x01);
        let err = inspect(&engine, &bytes, &SerializationContext::internal_storage()).unwrap_err();
        assert!(err.is_security_relevant());
    }
}
