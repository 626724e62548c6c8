//! `field-crypt` command-line entry point.
//!
//! Startup sequence:
//! 1. Parse the subcommand.
//! 2. Load and validate [`Config`] from environment variables.
//! 3. Initialise structured logging.
//! 4. Run the subcommand; encrypt/decrypt build an [`EncryptionCore`] from the
//!    configured key source and clear it before exit.

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use field_crypt::batch::{self, Operation};
use field_crypt::config::Config;
use field_crypt::{telemetry, EncryptionCore, SecretKey};

/// Encrypt and decrypt protected text fields.
#[derive(Parser, Debug)]
#[command(name = "field-crypt", version)]
#[command(about = "Encrypt and decrypt protected text fields, one per line")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt each stdin line; print one JSON outcome per line.
    Encrypt,
    /// Decrypt each stdin line; print one JSON outcome per line.
    Decrypt,
    /// Print a freshly generated Base64 key.
    GenerateKey,
    /// Make sure the configured key source yields a usable key.
    InitKey,
}

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let args = Args::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = ?args.command,
        "field-crypt starting"
    );

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    match args.command {
        Command::Encrypt => run_batch(&cfg, Operation::Encrypt),
        Command::Decrypt => run_batch(&cfg, Operation::Decrypt),
        Command::GenerateKey => {
            let key = SecretKey::generate().context("failed to generate key")?;
            println!("{}", key.to_base64().as_str());
            Ok(())
        }
        Command::InitKey => {
            cfg.build_key_source()?
                .fetch_key()
                .context("configured key source has no usable key")?;
            info!(key_source = %cfg.key_source, "key ready");
            Ok(())
        }
    }
}

fn run_batch(cfg: &Config, op: Operation) -> Result<()> {
    let transformation = cfg.transformation()?;
    let source = cfg.build_key_source()?;
    let core = EncryptionCore::with_transformation(source.as_ref(), transformation)
        .context("failed to initialise encryption core")?;

    let result = batch::process_lines(&core, op, io::stdin().lock(), io::stdout().lock());
    core.clear_key();

    let stats = result.context("failed to process fields")?;
    info!(
        processed = stats.processed,
        failed = stats.failed,
        %transformation,
        "batch complete"
    );
    Ok(())
}
