//! Configuration for the sandbox subsystem
//!
//! Follows a defaults-first layout: every field carries a serde default so a
//! minimal (or absent) configuration yields a working sandbox, and hosts can
//! override individual knobs programmatically or from a deserialized config
//! file.

use crate::errors::SandboxError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Base directory holding one subdirectory per sandbox instance.
    #[serde(default = "default_store_base")]
    pub store_base: PathBuf,
    /// Hard wall-clock limit for a single script run.
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,
    /// Limit for a dependency install; an unreachable package index must
    /// not hang the session forever.
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,
    /// Host interpreter used to build virtual environments. When unset,
    /// `python3` (then `python`) is looked up on PATH.
    #[serde(default)]
    pub interpreter: Option<PathBuf>,
    /// File extensions collected as image artifacts after a run.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Upper bound on concurrent subprocess-spawning operations across all
    /// instances.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            store_base: default_store_base(),
            execution_timeout_secs: default_execution_timeout(),
            install_timeout_secs: default_install_timeout(),
            interpreter: None,
            image_extensions: default_image_extensions(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl SandboxConfig {
    pub fn validate(&self) -> Result<(), SandboxError> {
        if self.execution_timeout_secs == 0 {
            return Err(SandboxError::ConfigError(
                "execution_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.install_timeout_secs == 0 {
            return Err(SandboxError::ConfigError(
                "install_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(SandboxError::ConfigError(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_store_base() -> PathBuf {
    // PYBOX_STORE mirrors the deployment convention of pointing the store
    // at a data directory instead of the system temp dir.
    std::env::var_os("PYBOX_STORE")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("pybox-store"))
}

fn default_execution_timeout() -> u64 {
    30
}

fn default_install_timeout() -> u64 {
    300
}

fn default_image_extensions() -> Vec<String> {
    vec![
        "png".to_string(),
        "jpg".to_string(),
        "jpeg".to_string(),
        "gif".to_string(),
    ]
}

fn default_max_concurrent_jobs() -> usize {
    4
}
