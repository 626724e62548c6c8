//! Structured logging setup.
//!
//! Logs are JSON on stderr; stdout is reserved for field output.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, IVs or key material** may appear in any log field.
//! - Log level is configurable via `FIELD_CRYPT_LOG_LEVEL` (default: `info`);
//!   `RUST_LOG` takes precedence when set.

pub mod init;

pub use init::init_telemetry;
