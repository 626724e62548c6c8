//! Record-by-record re-encryption of stored fields.
//!
//! For each JSON-lines record the tool:
//! 1. Decrypts `value` with the source core. This applies the same decode and
//!    minimum-length checks as any other reader before the cipher runs.
//! 2. Re-encrypts the plaintext with the target core.
//! 3. Writes the record back out. A rewritten record keeps every other member;
//!    an empty or undecryptable one is copied byte-for-byte.
//!
//! Plaintext only lives for the duration of one record and is zeroed after use.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use common::{
    protocol::{MigrationReport, StoredField},
    CryptoError,
};
use field_crypt::EncryptionCore;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Rewrite every record from `reader` into `writer`.
///
/// Records whose value cannot be decrypted are written unchanged and counted
/// in the report by error code.
///
/// # Errors
///
/// Returns an error if I/O fails or a line is not a [`StoredField`] record.
pub fn run<R, W>(
    reader: R,
    mut writer: W,
    source: &EncryptionCore,
    target: &EncryptionCore,
) -> Result<MigrationReport>
where
    R: BufRead,
    W: Write,
{
    let mut report = MigrationReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input record")?;
        if line.trim().is_empty() {
            continue;
        }
        let mut record: StoredField = serde_json::from_str(&line)
            .with_context(|| format!("line {} is not a stored field record", idx + 1))?;

        let rewritten = if record.value.is_empty() {
            report.unchanged_empty += 1;
            None
        } else {
            match reencrypt(&record.value, source, target) {
                Ok(value) => {
                    record.value = value;
                    report.migrated += 1;
                    debug!(id = %record.id, "record migrated");
                    Some(record)
                }
                Err(e) => {
                    warn!(id = %record.id, code = e.code(), "record left unchanged");
                    report.record_failure(&e);
                    None
                }
            }
        };

        match rewritten {
            Some(record) => {
                serde_json::to_writer(&mut writer, &record).context("failed to write record")?
            }
            None => writer
                .write_all(line.as_bytes())
                .context("failed to write record")?,
        }
        writer.write_all(b"\n").context("failed to write record")?;
    }

    writer.flush().context("failed to flush output")?;
    Ok(report)
}

fn reencrypt(
    encoded: &str,
    source: &EncryptionCore,
    target: &EncryptionCore,
) -> Result<String, CryptoError> {
    let plaintext = Zeroizing::new(source.decrypt(encoded)?);
    target.encrypt(&plaintext)
}
