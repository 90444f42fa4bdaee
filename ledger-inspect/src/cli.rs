//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ledger_serialization::WhitelistMode;

/// Decode a ledger serialization stream and print what it holds.
#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-inspect")]
#[command(about = "Decode and print ledger serialization streams")]
#[command(version)]
pub struct Cli {
    /// Encoded stream as hex text, or a path when `--file` is given.
    pub input: String,

    /// Read the input as hex text (the default).
    #[arg(long, conflicts_with = "file")]
    pub hex: bool,

    /// Read the input from a binary file.
    #[arg(long)]
    pub file: bool,

    /// Context to decode under.
    #[arg(long, value_enum, default_value = "network")]
    pub mode: Mode,

    /// Engine configuration file (TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured maximum nesting depth.
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Override the configured maximum blob length.
    #[arg(long)]
    pub max_blob_len: Option<usize>,

    /// Override the configured stream chunk size.
    #[arg(long)]
    pub stream_chunk_size: Option<usize>,

    /// Accept input left over after the top-level value.
    #[arg(long)]
    pub allow_trailing: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Decode context selected on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Bytes received from a peer; only whitelisted types decode.
    Network,
    /// Trusted local storage; every registered type decodes.
    Storage,
}

impl From<Mode> for WhitelistMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Network => WhitelistMode::ExternalNetwork,
            Mode::Storage => WhitelistMode::InternalStorage,
        }
    }
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
