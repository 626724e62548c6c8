//! JSON types exchanged with the UI and persistence collaborators.
//!
//! Collaborators only ever see plain strings and a generic failure notice;
//! raw keys, IVs and the specific failure kind stay inside the core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, GENERIC_FAILURE_MESSAGE};

// ---------------------------------------------------------------------------
// Field outcome
// ---------------------------------------------------------------------------

/// Result of processing one field, as handed to a collaborator.
///
/// Serialises as `{"status":"ok","value":"…"}` or
/// `{"status":"failed","notice":{…}}`, so an empty `value` is never confused
/// with a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// The operation succeeded; `value` may be the empty string.
    Ok { value: String },
    /// The operation failed; the notice is intentionally generic.
    Failed { notice: FailureNotice },
}

impl FieldOutcome {
    /// Returns `true` for [`FieldOutcome::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, FieldOutcome::Ok { .. })
    }
}

impl From<Result<String, CryptoError>> for FieldOutcome {
    fn from(result: Result<String, CryptoError>) -> Self {
        match result {
            Ok(value) => FieldOutcome::Ok { value },
            Err(_) => FieldOutcome::Failed {
                notice: FailureNotice::generic(),
            },
        }
    }
}

/// Failure body rendered to collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureNotice {
    /// Always `"field_unavailable"`.
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl FailureNotice {
    /// The one notice used for every failure kind.
    pub fn generic() -> Self {
        Self {
            code: "field_unavailable".into(),
            message: GENERIC_FAILURE_MESSAGE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// One persisted field: an opaque record id and its encoded envelope.
///
/// Any other members of the record are carried in `extra` and written back
/// as they were read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredField {
    pub id: String,
    pub value: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Summary printed by the migration tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Records re-encrypted under the target transformation.
    pub migrated: usize,
    /// Records with an empty value, passed through untouched.
    pub unchanged_empty: usize,
    /// Records that could not be decrypted and were written unchanged.
    pub failed: usize,
    /// Failure counts keyed by [`CryptoError::code`].
    pub failures_by_code: BTreeMap<String, usize>,
}

impl MigrationReport {
    /// Count one failed record.
    pub fn record_failure(&mut self, err: &CryptoError) {
        self.failed += 1;
        *self
            .failures_by_code
            .entry(err.code().to_owned())
            .or_default() += 1;
    }
}
