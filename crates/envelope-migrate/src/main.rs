//! `envelope-migrate`: offline re-encryption of stored field envelopes.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Build source and target cores from the key file.
//! 4. Rewrite the input records, clear both cores, print the report.

mod config;
mod migrate;
mod telemetry;

use std::{
    fs::File,
    io::{BufReader, BufWriter},
};

use anyhow::{Context, Result};
use field_crypt::{EncryptionCore, FileKeySource};
use tracing::{info, warn};

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        eprintln!("ERROR: envelope-migrate configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 3. Cores
    // -----------------------------------------------------------------------
    let key_source = FileKeySource::new(&cfg.key_file, false);
    let source = EncryptionCore::with_transformation(&key_source, cfg.source_transformation()?)
        .context("failed to initialise source encryption core")?;
    let target = EncryptionCore::with_transformation(&key_source, cfg.target_transformation()?)
        .context("failed to initialise target encryption core")?;
    info!(
        input = %cfg.input_path,
        output = %cfg.output_path,
        from = %source.transformation(),
        to = %target.transformation(),
        "envelope-migrate starting"
    );

    // -----------------------------------------------------------------------
    // 4. Migration
    // -----------------------------------------------------------------------
    let input = File::open(&cfg.input_path)
        .with_context(|| format!("failed to open input {}", cfg.input_path))?;
    let output = File::create(&cfg.output_path)
        .with_context(|| format!("failed to create output {}", cfg.output_path))?;

    let result = migrate::run(
        BufReader::new(input),
        BufWriter::new(output),
        &source,
        &target,
    );
    source.clear_key();
    target.clear_key();

    let report = result?;
    if report.failed > 0 {
        warn!(failed = report.failed, "some records could not be migrated");
    }
    info!(migrated = report.migrated, "envelope-migrate finished");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
