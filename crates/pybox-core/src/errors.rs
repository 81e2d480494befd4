//! Error types for the sandbox subsystem
//!
//! Only conditions that make a sandbox itself unusable surface as errors: a
//! missing interpreter toolchain, a root directory that cannot be created,
//! or a call against an instance that has already been destroyed. Everything
//! about the executed script's behavior (non-zero exits, crashes, timeouts)
//! is an expected outcome and travels back as data in `ExecutionResult`, so
//! callers can show it to the end user instead of handling an exception.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SandboxError {
    #[error("Environment setup failed: {0}")]
    SetupError(String),
    #[error("Interpreter not found: {0}")]
    InterpreterNotFound(String),
    #[error("Sandbox '{0}' has been destroyed")]
    Destroyed(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for SandboxError {
    fn from(err: std::io::Error) -> Self {
        SandboxError::IoError(err.to_string())
    }
}
