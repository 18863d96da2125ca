//! Shared types for the credential cache workspace
//!
//! `Secret` wraps token material so it never reaches Debug output or logs;
//! `Error` covers configuration and file loading.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
