//! Artifact collection and transport encoding.
//!
//! Scripts drop plot files and other images into their working directory as
//! a side effect; after every run the sandbox sweeps the directory top level
//! and returns whatever image files are present, base64-encoded for
//! transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;

/// Collects top-level files in `dir` whose extension matches `extensions`
/// and returns their contents base64-encoded, in directory enumeration
/// order (not guaranteed stable across platforms).
///
/// Best-effort: unreadable entries are skipped with a warning so a single
/// bad file cannot turn a finished run into a failure.
pub async fn collect_images(dir: &Path, extensions: &[String]) -> Vec<String> {
    let mut images = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Could not scan {} for artifacts: {}", dir.display(), e);
            return images;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if !is_image(&path, extensions) {
                    continue;
                }
                match tokio::fs::read(&path).await {
                    Ok(bytes) => images.push(STANDARD.encode(bytes)),
                    Err(e) => {
                        log::warn!("Skipping unreadable artifact {}: {}", path.display(), e)
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("Artifact scan of {} aborted: {}", dir.display(), e);
                break;
            }
        }
    }
    images
}

fn is_image(path: &Path, extensions: &[String]) -> bool {
    if !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
