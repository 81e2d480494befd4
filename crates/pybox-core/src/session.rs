//! Session-to-sandbox binding.
//!
//! Maps an external session key to exactly one sandbox identifier: the
//! first request for a session constructs an instance and records its id,
//! later requests resume it, and releasing the session destroys it and
//! forgets the id. Cleanup is always the last operation performed against
//! a given identifier.
//!
//! The binder assumes the web layer drives each session sequentially (one
//! in-flight request per session); it serializes nothing across requests
//! of the same session beyond the per-instance locking the sandbox itself
//! provides.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

use crate::config::SandboxConfig;
use crate::errors::SandboxError;
use crate::sandbox::Sandbox;
use crate::store::EnvironmentStore;

pub struct SessionBinder {
    config: SandboxConfig,
    bindings: Mutex<HashMap<String, String>>,
    jobs: Arc<Semaphore>,
}

impl SessionBinder {
    pub fn new(config: SandboxConfig) -> Self {
        let jobs = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self {
            config,
            bindings: Mutex::new(HashMap::new()),
            jobs,
        }
    }

    pub fn store(&self) -> EnvironmentStore {
        EnvironmentStore::new(self.config.store_base.clone())
    }

    /// Discards all on-disk sandbox state. Call once at process startup,
    /// before the first `resolve`.
    pub fn wipe_store(&self) {
        self.store().wipe();
    }

    /// Returns the session's sandbox, constructing and recording a fresh
    /// one on first use.
    pub async fn resolve(&self, session: &str) -> Result<Sandbox, SandboxError> {
        let known_id = self.bindings.lock().await.get(session).cloned();

        let sandbox = Sandbox::new_or_resume(known_id.as_deref(), self.config.clone()).await?;

        self.bindings
            .lock()
            .await
            .insert(session.to_string(), sandbox.id().to_string());
        Ok(sandbox.with_job_limiter(self.jobs.clone()))
    }

    /// Destroys the session's sandbox, if any, and forgets its identifier.
    pub async fn release(&self, session: &str) {
        let id = self.bindings.lock().await.remove(session);
        let Some(id) = id else {
            return;
        };
        match Sandbox::new_or_resume(Some(&id), self.config.clone()).await {
            Ok(mut sandbox) => sandbox.cleanup().await,
            // The directory may already be gone (store wipe, disk cleanup);
            // the binding is forgotten either way.
            Err(e) => log::warn!("Could not resume sandbox '{}' for cleanup: {}", id, e),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_utils::test_config;
    use tempfile::tempdir;

    #[tokio::test]
    async fn same_session_resumes_the_same_sandbox() {
        let temp = tempdir().unwrap();
        let binder = SessionBinder::new(test_config(temp.path()));

        let first = binder.resolve("session-1").await.unwrap();
        let sentinel = first.root().join("venv").join("sentinel");
        std::fs::write(&sentinel, b"keep me").unwrap();

        let second = binder.resolve("session-1").await.unwrap();
        assert_eq!(first.id(), second.id());
        // Resume must not have rebuilt the environment.
        assert!(sentinel.exists());
    }

    #[tokio::test]
    async fn distinct_sessions_get_distinct_sandboxes() {
        let temp = tempdir().unwrap();
        let binder = SessionBinder::new(test_config(temp.path()));

        let a = binder.resolve("session-a").await.unwrap();
        let b = binder.resolve("session-b").await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.root(), b.root());
    }

    #[tokio::test]
    async fn release_destroys_and_forgets() {
        let temp = tempdir().unwrap();
        let binder = SessionBinder::new(test_config(temp.path()));

        let first = binder.resolve("session-1").await.unwrap();
        let root = first.root().to_path_buf();
        let first_id = first.id().to_string();
        assert!(root.exists());

        binder.release("session-1").await;
        assert!(!root.exists());

        // A later request for the same session starts over.
        let second = binder.resolve("session-1").await.unwrap();
        assert_ne!(second.id(), first_id);
    }

    #[tokio::test]
    async fn release_of_unknown_session_is_a_noop() {
        let temp = tempdir().unwrap();
        let binder = SessionBinder::new(test_config(temp.path()));
        binder.release("never-seen").await;
    }

    #[tokio::test]
    async fn wipe_store_clears_the_base_directory() {
        let temp = tempdir().unwrap();
        let config = test_config(temp.path());
        let base = config.store_base.clone();
        let binder = SessionBinder::new(config);

        let sandbox = binder.resolve("session-1").await.unwrap();
        assert!(sandbox.root().exists());
        drop(sandbox);

        binder.wipe_store();
        assert!(!base.exists());
    }
}
