//! ConvoBot core crate - shared types, error taxonomy, and configuration.
//!
//! Everything here is plain data and plumbing used by every other crate in
//! the workspace; no I/O beyond config file access.

pub mod config;
pub mod error;
pub mod types;

pub use config::ConvoConfig;
pub use error::{ConvoError, Result};
pub use types::*;
