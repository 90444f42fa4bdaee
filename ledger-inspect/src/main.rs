//! Ledger serialization inspector.
//!
//! Decodes a stream under a chosen context and prints the reconstructed
//! value, for triaging rejected peer messages and corrupt storage blobs.

mod cli;
mod inspect;

use std::process::ExitCode;

use ledger_serialization::{SerializationContext, SerializationEngine};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Exit code for a stream the engine refused to decode.
const EXIT_REJECTED: u8 = 2;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("ledger-inspect v{}", env!("CARGO_PKG_VERSION"));

    let config = inspect::engine_config(&cli)?;
    let engine = SerializationEngine::with_config(config)?;
    let ctx = SerializationContext::new(cli.mode.into());
    let bytes = inspect::load_input(&cli)?;

    match inspect::inspect(&engine, &bytes, &ctx) {
        Ok(report) => {
            println!("{report}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::warn!(mode = %ctx.mode(), security = err.is_security_relevant(), "stream rejected");
            eprintln!("rejected: {err}");
            Ok(ExitCode::from(EXIT_REJECTED))
        }
    }
}
