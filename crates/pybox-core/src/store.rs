//! The process-wide environment store and its startup janitor.

use std::path::{Path, PathBuf};

/// Base directory holding one root directory per sandbox instance.
///
/// Instances never share a root: identifiers are unique, so directory-tree
/// mutations need no locking beyond what each instance does for its own
/// subprocesses.
pub struct EnvironmentStore {
    base: PathBuf,
}

impl EnvironmentStore {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn instance_root(&self, id: &str) -> PathBuf {
        self.base.join(id)
    }

    /// Discards every sandbox left over from a previous process run.
    ///
    /// Identifiers are only meaningful within one process lifetime, so at
    /// startup everything on disk is stale. This is a startup-only
    /// maintenance operation: it must not run while any instance is live.
    /// Failures are logged, not propagated.
    pub fn wipe(&self) {
        if !self.base.exists() {
            return;
        }
        log::info!("Wiping sandbox store at {}", self.base.display());
        if let Err(e) = std::fs::remove_dir_all(&self.base) {
            log::warn!("Failed to wipe sandbox store {}: {}", self.base.display(), e);
        }
    }
}

/// Convenience wrapper for the startup janitor.
pub fn wipe_store<P: Into<PathBuf>>(base: P) {
    EnvironmentStore::new(base).wipe();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wipe_removes_the_whole_store() {
        let temp = tempdir().unwrap();
        let base = temp.path().join("store");
        std::fs::create_dir_all(base.join("instance-a").join("venv")).unwrap();
        std::fs::create_dir_all(base.join("instance-b")).unwrap();

        EnvironmentStore::new(&base).wipe();
        assert!(!base.exists());
    }

    #[test]
    fn wipe_on_missing_store_is_a_noop() {
        let temp = tempdir().unwrap();
        let base = temp.path().join("never-created");

        // Must not panic or create the directory as a side effect.
        wipe_store(&base);
        assert!(!base.exists());
    }

    #[test]
    fn instance_roots_are_distinct_per_id() {
        let store = EnvironmentStore::new("/some/base");
        assert_ne!(store.instance_root("a"), store.instance_root("b"));
        assert_eq!(store.instance_root("a"), store.instance_root("a"));
    }
}
