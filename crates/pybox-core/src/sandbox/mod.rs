//! Isolated execution environments for untrusted, generated code.
//!
//! Each sandbox owns a private directory with its own Python virtual
//! environment. Scripts run as subprocesses with a hard wall-clock timeout,
//! and a failing script is a result, not an error: stdout, stderr, and any
//! image artifacts the run produced come back in `ExecutionResult`
//! regardless of how the script exited.

use crate::errors::SandboxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything a single run produced. Constructed fresh on every execution;
/// never persisted by the sandbox itself.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// Base64-encoded image files found in the working directory after the
    /// run, in filesystem enumeration order.
    pub images: Vec<String>,
}

/// Shape handed over by the upstream code generator. The sandbox never
/// calls the generator; this value is the entire contract between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub code: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute_code(&self, code: &str) -> Result<ExecutionResult, SandboxError>;
}

pub mod artifacts;
pub mod instance;

pub use instance::Sandbox;
