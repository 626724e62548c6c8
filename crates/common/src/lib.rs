//! Common types, boundary definitions, and errors shared across `field-crypt` crates.

pub mod error;
pub mod protocol;

pub use error::CryptoError;
