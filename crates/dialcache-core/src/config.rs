//! Invocation configuration read from the CI environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Exact key used by both restore and save.
pub const CACHE_KEY_VAR: &str = "CACHE_KEY";
/// First restore fallback prefix.
pub const OTP_PREFIX_VAR: &str = "OTP_PREFIX";
/// Second restore fallback prefix.
pub const SYSTEM_PREFIX_VAR: &str = "SYSTEM_PREFIX";

/// Keys for one restore or save invocation.
///
/// Built once at process start and handed to each operation by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationConfig {
    /// Exact cache key.
    pub cache_key: String,
    /// Preferred fallback prefix (OTP release scoped).
    pub otp_prefix: Option<String>,
    /// Secondary fallback prefix (runner system scoped).
    pub system_prefix: Option<String>,
}

impl InvocationConfig {
    pub fn new(cache_key: impl Into<String>) -> Self {
        Self {
            cache_key: cache_key.into(),
            otp_prefix: None,
            system_prefix: None,
        }
    }

    /// Set the OTP fallback prefix.
    pub fn with_otp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.otp_prefix = Some(prefix.into());
        self
    }

    /// Set the system fallback prefix.
    pub fn with_system_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.system_prefix = Some(prefix.into());
        self
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let cache_key =
            non_empty(CACHE_KEY_VAR).ok_or_else(|| Error::MissingConfig(CACHE_KEY_VAR.into()))?;

        Ok(Self {
            cache_key,
            otp_prefix: non_empty(OTP_PREFIX_VAR),
            system_prefix: non_empty(SYSTEM_PREFIX_VAR),
        })
    }

    /// Ordered fallback prefixes. Unset or empty positions are skipped.
    pub fn restore_keys(&self) -> Vec<String> {
        [&self.otp_prefix, &self.system_prefix]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect()
    }
}
