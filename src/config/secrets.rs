//! Secret handling utilities.
//!
//! Re-exports secrecy types so callers expose credentials only at the
//! HTTP and database boundaries.

pub use secrecy::{ExposeSecret, SecretString};
