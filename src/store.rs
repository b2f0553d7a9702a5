//! The output directory.
//!
//! Artifacts live flat in one directory. Names carry a content hash and a
//! random suffix so concurrent writers never pick the same file. In-progress
//! files and per-request work directories are hidden (dot-prefixed) and never
//! listed as artifacts.

use crate::artifact::AudioArtifact;
use crate::{Error, ErrorContext, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const WORK_DIR_PREFIX: &str = ".work-";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the output directory at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| io_error("cannot create output directory", &root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<stem>-<sha256(seed)[..8]>-<random[..8]>.<ext>` inside the root.
    pub fn artifact_path(&self, stem: &str, seed: &[u8], ext: &str) -> PathBuf {
        let digest = Sha256::digest(seed);
        let hash: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let stem = sanitize_stem(stem);
        self.root
            .join(format!("{}-{}-{}.{}", stem, hash, &nonce[..8], ext))
    }

    /// Create a fresh scratch directory for one request.
    pub fn create_work_dir(&self) -> Result<PathBuf> {
        let dir = self.root.join(format!(
            "{}{}",
            WORK_DIR_PREFIX,
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::create_dir(&dir).map_err(|e| io_error("cannot create work directory", &dir, e))?;
        Ok(dir)
    }

    /// Artifacts currently in the directory, sorted by file name.
    pub fn list(&self) -> Result<Vec<AudioArtifact>> {
        let mut artifacts = Vec::new();
        for path in self.visible_files()? {
            match AudioArtifact::open(&path) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }
        artifacts.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(artifacts)
    }

    /// Delete one artifact. Paths outside the root are refused.
    pub fn remove(&self, path: &Path) -> Result<()> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if resolved.parent() != Some(self.root.as_path()) {
            return Err(Error::configuration_with_context(
                "refusing to delete a file outside the output directory",
                ErrorContext::new().with_details(path.display().to_string()),
            ));
        }
        std::fs::remove_file(&resolved)
            .map_err(|e| io_error("cannot delete artifact", &resolved, e))
    }

    /// Delete every artifact and any leftover work directories.
    /// Returns the number of artifacts removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.visible_files()? {
            std::fs::remove_file(&path).map_err(|e| io_error("cannot delete artifact", &path, e))?;
            removed += 1;
        }
        for entry in self.entries()? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if name.starts_with(WORK_DIR_PREFIX) && path.is_dir() {
                std::fs::remove_dir_all(&path)
                    .map_err(|e| io_error("cannot delete work directory", &path, e))?;
            } else if name.starts_with('.') && name.ends_with(".part") {
                let _ = std::fs::remove_file(&path);
            }
        }
        debug!(root = %self.root.display(), removed, "output directory cleared");
        Ok(removed)
    }

    fn entries(&self) -> Result<Vec<std::fs::DirEntry>> {
        let read = std::fs::read_dir(&self.root)
            .map_err(|e| io_error("cannot read output directory", &self.root, e))?;
        read.collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| io_error("cannot read output directory", &self.root, e))
    }

    fn visible_files(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect())
    }
}

/// Remove a request's work directory, logging instead of failing.
pub(crate) fn discard_work_dir(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        warn!(path = %dir.display(), error = %e, "failed to remove work directory");
    }
}

fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        "speech".to_string()
    } else {
        cleaned.to_string()
    }
}

// Output-directory failures surface as assembly failures: the audio could not
// be turned into an artifact on disk.
fn io_error(what: &str, path: &Path, err: std::io::Error) -> Error {
    Error::assembly_with_context(
        format!("{}: {}", what, err),
        ErrorContext::new()
            .with_field_path(path.display().to_string())
            .with_source("artifact_store"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_hash_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        let a = store.artifact_path("speech", b"hello", "wav");
        let b = store.artifact_path("speech", b"hello", "wav");
        assert_ne!(a, b);

        let name_a = a.file_name().unwrap().to_str().unwrap();
        let name_b = b.file_name().unwrap().to_str().unwrap();
        assert!(name_a.starts_with("speech-"));
        assert!(name_a.ends_with(".wav"));
        // Same seed, same hash segment.
        assert_eq!(name_a.split('-').nth(1), name_b.split('-').nth(1));
    }

    #[test]
    fn stems_are_sanitized() {
        assert_eq!(sanitize_stem("my talk/../x"), "my-talk----x");
        assert_eq!(sanitize_stem("///"), "speech");
    }

    #[test]
    fn list_skips_hidden_files_and_work_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join(".speech.wav.part"), b"partial").unwrap();
        store.create_work_dir().unwrap();

        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn clear_removes_files_and_work_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out")).unwrap();
        std::fs::write(store.root().join("a.bin"), b"1").unwrap();
        std::fs::write(store.root().join("b.bin"), b"2").unwrap();
        let work = store.create_work_dir().unwrap();
        std::fs::write(work.join("chunk_0.wav"), b"x").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(!work.exists());
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn remove_refuses_outside_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out")).unwrap();
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, b"keep").unwrap();

        assert!(store.remove(&outside).is_err());
        assert!(outside.exists());

        std::fs::write(store.root().join("gone.bin"), b"x").unwrap();
        store.remove(Path::new("gone.bin")).unwrap();
        assert!(!store.root().join("gone.bin").exists());
    }
}
