//! Line-oriented processing of fields for the command-line boundary.
//!
//! Every input line is one field. Every output line is one JSON
//! [`FieldOutcome`], so callers can tell an empty result apart from a failure.

use std::io::{self, BufRead, Write};

use common::protocol::{FailureNotice, FieldOutcome};
use tracing::warn;
use zeroize::Zeroizing;

use crate::EncryptionCore;

/// Direction of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encrypt,
    Decrypt,
}

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub failed: usize,
}

/// Apply `op` to every line of `reader`, writing one JSON outcome per line.
///
/// Failures are logged with their error code and rendered to the output only
/// as the generic notice. A line that is not UTF-8 fails on its own and the
/// rest of the input is still processed.
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails.
pub fn process_lines<R, W>(
    core: &EncryptionCore,
    op: Operation,
    mut reader: R,
    mut writer: W,
) -> io::Result<BatchStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = BatchStats::default();
    let mut buf = Zeroizing::new(Vec::new());
    let mut line_no = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut *buf)? == 0 {
            break;
        }
        line_no += 1;
        stats.processed += 1;

        let outcome = match std::str::from_utf8(trim_line_end(&buf[..])) {
            Ok(line) => {
                let result = match op {
                    Operation::Encrypt => core.encrypt(line),
                    Operation::Decrypt => core.decrypt(line),
                };
                if let Err(e) = &result {
                    stats.failed += 1;
                    warn!(line = line_no, code = e.code(), ?op, "field operation failed");
                }
                FieldOutcome::from(result)
            }
            Err(_) => {
                stats.failed += 1;
                warn!(line = line_no, code = "invalid_utf8", ?op, "field operation failed");
                FieldOutcome::Failed {
                    notice: FailureNotice::generic(),
                }
            }
        };
        serde_json::to_writer(&mut writer, &outcome)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(stats)
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
