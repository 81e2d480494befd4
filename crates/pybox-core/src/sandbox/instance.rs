//! The sandbox instance: per-session directory, virtual environment,
//! dependency installation, and timed script execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;
use which::which;

use super::artifacts;
use super::{CodeExecutor, ExecutionResult};
use crate::config::SandboxConfig;
use crate::errors::SandboxError;

/// Last submitted script, overwritten on each run. Only one script is ever
/// in flight per instance.
pub const SCRIPT_FILENAME: &str = "script.py";

/// Subdirectory of the instance root holding the virtual environment.
pub const VENV_DIRNAME: &str = "venv";

const TIMEOUT_MESSAGE: &str = "Execution timed out.";
const INSTALL_TIMEOUT_MESSAGE: &str = "Dependency installation timed out.";

/// An isolated execution environment for one caller session.
///
/// Owns `<store_base>/<id>` exclusively; no other instance may touch it.
/// Operations on a single instance are serialized internally, so a caller
/// that accidentally issues overlapping `execute` calls waits instead of
/// racing on the script file.
pub struct Sandbox {
    id: String,
    root: PathBuf,
    venv: PathBuf,
    config: SandboxConfig,
    destroyed: bool,
    run_lock: Mutex<()>,
    jobs: Option<Arc<Semaphore>>,
}

impl Sandbox {
    /// Creates a new sandbox or resumes an existing one.
    ///
    /// Resuming (an `id` whose environment already exists on disk) skips the
    /// environment build entirely, so per-request construction inside a
    /// session stays cheap. A failed build propagates synchronously and
    /// leaves nothing usable behind.
    pub async fn new_or_resume(
        id: Option<&str>,
        config: SandboxConfig,
    ) -> Result<Self, SandboxError> {
        let resumed = id.is_some();
        let id = id
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let root = config.store_base.join(&id);
        let venv = root.join(VENV_DIRNAME);

        let sandbox = Self {
            id,
            root,
            venv,
            config,
            destroyed: false,
            run_lock: Mutex::new(()),
            jobs: None,
        };

        if resumed && sandbox.venv.exists() {
            log::info!("Resuming existing sandbox: {}", sandbox.id);
        } else {
            log::info!(
                "Initializing sandbox: {} at {}",
                sandbox.id,
                sandbox.root.display()
            );
            sandbox.setup().await?;
        }
        Ok(sandbox)
    }

    /// Attaches a process-wide semaphore bounding concurrent subprocess
    /// jobs; dependency installs in particular are expensive to fork/exec
    /// in bulk.
    pub fn with_job_limiter(mut self, jobs: Arc<Semaphore>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the virtual environment. No-op if it already exists.
    async fn setup(&self) -> Result<(), SandboxError> {
        if self.venv.exists() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let interpreter = self.host_interpreter()?;
        log::info!("Creating virtual environment in {}...", self.venv.display());
        let output = Command::new(&interpreter)
            .arg("-m")
            .arg("venv")
            .arg(&self.venv)
            .output()
            .await
            .map_err(|e| {
                SandboxError::SetupError(format!(
                    "failed to launch '{}': {}",
                    interpreter.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SandboxError::SetupError(format!(
                "venv creation failed: {}",
                stderr
            )));
        }
        log::info!("Virtual environment created.");
        Ok(())
    }

    /// Installs packages into the instance's environment.
    ///
    /// Dependency lists come from an unreliable upstream generator, so a
    /// failed install returns a descriptive message instead of an error:
    /// the caller may still decide to execute the script. `Err` is reserved
    /// for instance-level misuse (the sandbox was destroyed).
    pub async fn install(&self, packages: &[String]) -> Result<Option<String>, SandboxError> {
        self.ensure_live()?;
        if packages.is_empty() {
            return Ok(None);
        }

        let _guard = self.run_lock.lock().await;
        let _permit = self.job_permit().await;

        log::info!("Installing dependencies: {:?}...", packages);
        let mut command = Command::new(self.venv_tool("pip"));
        command
            .arg("install")
            .args(packages)
            .current_dir(&self.root)
            .kill_on_drop(true);

        let timeout = Duration::from_secs(self.config.install_timeout_secs);
        match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                log::info!("Dependencies installed successfully.");
                Ok(None)
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                log::error!("Error installing dependencies: {}", stderr);
                Ok(Some(format!("Error installing dependencies: {}", stderr)))
            }
            Ok(Err(e)) => {
                log::error!("Failed to launch pip: {}", e);
                Ok(Some(format!("Error installing dependencies: {}", e)))
            }
            Err(_) => {
                log::error!(
                    "Dependency installation timed out after {}s.",
                    timeout.as_secs()
                );
                Ok(Some(INSTALL_TIMEOUT_MESSAGE.to_string()))
            }
        }
    }

    /// Runs `code` inside the sandbox and captures everything it produced.
    ///
    /// Script-level failure never raises: non-zero exits surface through
    /// `stderr`, a timeout yields empty stdout plus a fixed timeout notice,
    /// and a spawn failure (interpreter missing from the venv) is reported
    /// the same way. `Err` is reserved for instance-level misuse.
    pub async fn execute(&self, code: &str) -> Result<ExecutionResult, SandboxError> {
        self.ensure_live()?;

        let _guard = self.run_lock.lock().await;
        let _permit = self.job_permit().await;

        log::info!("Preparing to run code...");
        let script_path = self.root.join(SCRIPT_FILENAME);
        tokio::fs::write(&script_path, code).await?;

        let mut command = Command::new(self.venv_tool("python"));
        command
            .arg(SCRIPT_FILENAME)
            .current_dir(&self.root)
            // Dropping the timed-out future must kill the interpreter, not
            // leave it looping in the background.
            .kill_on_drop(true);

        log::info!("Executing script: {}", script_path.display());
        let timeout = Duration::from_secs(self.config.execution_timeout_secs);
        let (stdout, stderr) = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => {
                log::info!("Execution completed.");
                (
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                )
            }
            Ok(Err(e)) => {
                log::error!("Execution failed: {}", e);
                (String::new(), e.to_string())
            }
            Err(_) => {
                log::error!("Execution timed out.");
                (String::new(), TIMEOUT_MESSAGE.to_string())
            }
        };

        let images = artifacts::collect_images(&self.root, &self.config.image_extensions).await;
        if !images.is_empty() {
            log::info!("Captured {} images.", images.len());
        }

        Ok(ExecutionResult {
            stdout,
            stderr,
            images,
        })
    }

    /// Removes the instance's root directory and marks the sandbox
    /// destroyed. Idempotent; removal failures are logged rather than
    /// propagated since cleanup runs during best-effort session teardown.
    pub async fn cleanup(&mut self) {
        self.destroyed = true;
        if !self.root.exists() {
            return;
        }
        log::info!("Cleaning up sandbox: {}", self.root.display());
        if let Err(e) = tokio::fs::remove_dir_all(&self.root).await {
            log::warn!("Failed to remove {}: {}", self.root.display(), e);
        }
    }

    fn ensure_live(&self) -> Result<(), SandboxError> {
        if self.destroyed {
            Err(SandboxError::Destroyed(self.id.clone()))
        } else {
            Ok(())
        }
    }

    fn host_interpreter(&self) -> Result<PathBuf, SandboxError> {
        if let Some(path) = &self.config.interpreter {
            return Ok(path.clone());
        }
        which("python3").or_else(|_| which("python")).map_err(|_| {
            SandboxError::InterpreterNotFound(
                "no python3 or python binary found on PATH".to_string(),
            )
        })
    }

    /// Resolves a tool inside the virtual environment, accounting for the
    /// platform-specific venv layout.
    fn venv_tool(&self, tool: &str) -> PathBuf {
        if cfg!(windows) {
            self.venv.join("Scripts").join(format!("{}.exe", tool))
        } else {
            self.venv.join("bin").join(tool)
        }
    }

    async fn job_permit(&self) -> Option<OwnedSemaphorePermit> {
        match &self.jobs {
            Some(jobs) => jobs.clone().acquire_owned().await.ok(),
            None => None,
        }
    }
}

#[async_trait]
impl CodeExecutor for Sandbox {
    async fn execute_code(&self, code: &str) -> Result<ExecutionResult, SandboxError> {
        self.execute(code).await
    }
}
