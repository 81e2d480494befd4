//! Library for running untrusted, generated Python code in isolation.
//!
//! This crate provides the execution backend for applications that hand
//! machine-generated scripts to an interpreter: each caller session gets its
//! own on-disk sandbox with a private virtual environment, scripts run as
//! subprocesses under a hard wall-clock timeout, and everything the script
//! does (output, errors, image artifacts) is captured and returned as data.
//!
//! # Architecture Overview
//!
//! The crate is organized around a few small subsystems:
//!
//! - **Sandbox instances**: per-session directories with an isolated Python
//!   environment, dependency installation, and timed script execution
//! - **Environment store**: the process-wide directory tree holding all
//!   instances, plus the startup janitor that discards stale state
//! - **Session binding**: maps an external session key to exactly one live
//!   sandbox, resuming it across requests and destroying it on release
//! - **Artifact encoding**: collects image files produced by a run and
//!   encodes them for transport
//!
//! Isolation is directory- and process-level, not kernel-level: a sandbox
//! protects the host application and other sessions from filesystem clutter
//! and runaway interpreters, not from a determined attacker.

pub mod config;
pub mod errors;
pub mod sandbox;
pub mod session;
pub mod store;

pub use config::SandboxConfig;
pub use errors::SandboxError;
pub use sandbox::{CodeExecutor, CodeSubmission, ExecutionResult, Sandbox};
pub use session::SessionBinder;
pub use store::EnvironmentStore;

#[cfg(test)]
pub mod test_utils;
