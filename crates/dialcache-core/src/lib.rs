//! dialcache core
//!
//! Shared vocabulary for the dialcache crates: the error type, the
//! invocation configuration read from the CI environment, and the fixed
//! path pattern selecting the cached PLT files.

pub mod config;
pub mod error;

pub use config::InvocationConfig;
pub use error::{Error, Result};

/// Glob selecting the dialyxir PLT and its `.plt.hash` companion, relative
/// to the project root.
pub const PLT_PATH_PATTERN: &str = "_build/*/dialyxir*.plt*";
