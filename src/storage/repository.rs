//! Repository and quarantine layout.
//!
//! Two flat namespaces on disk: `repository_dir` holds published files,
//! visible to LIST and GET; `quarantine_dir/<user>/` holds each user's
//! uploads awaiting approval. Only [`Repository::publish`] moves a file
//! from one to the other, as a single atomic rename.

use crate::config::StorageConfig;
use crate::error::{DepotError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Validate a peer-supplied filename before it becomes a path component.
///
/// The wire protocol trusts filenames verbatim; this check scopes them to
/// exactly one entry under the relevant directory. Rejects empty names,
/// path separators, NUL, and the `.`/`..` pseudo-entries.
pub fn validate_name(name: &str) -> Result<&str> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');

    if bad {
        Err(DepotError::InvalidName(name.to_string()))
    } else {
        Ok(name)
    }
}

/// Handle to the depot's on-disk layout. Cheap to clone; one per session.
#[derive(Debug, Clone)]
pub struct Repository {
    repository_dir: PathBuf,
    quarantine_dir: PathBuf,
}

impl Repository {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            repository_dir: config.repository_dir.clone(),
            quarantine_dir: config.quarantine_dir.clone(),
        }
    }

    pub fn repository_dir(&self) -> &Path {
        &self.repository_dir
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    /// Create both directory trees if absent. Called once at startup.
    pub async fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(&self.repository_dir).await?;
        fs::create_dir_all(&self.quarantine_dir).await?;
        Ok(())
    }

    /// Enumerate published entries, in directory order. Quarantined files
    /// never appear here.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.repository_dir)
            .await
            .map_err(|e| DepotError::Storage(format!("cannot read repository: {e}")))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| DepotError::Storage(format!("cannot read repository: {e}")))?
        {
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(entries)
    }

    /// Size of a published entry; absent entries are a storage error.
    pub async fn entry_size(&self, name: &str) -> Result<u64> {
        let path = self.repository_dir.join(validate_name(name)?);
        let meta = fs::metadata(&path)
            .await
            .map_err(|e| DepotError::Storage(format!("no such entry {name:?}: {e}")))?;

        if !meta.is_file() {
            return Err(DepotError::Storage(format!("{name:?} is not a file")));
        }
        Ok(meta.len())
    }

    /// Open a published entry for reading.
    pub async fn open_entry(&self, name: &str) -> Result<fs::File> {
        let path = self.repository_dir.join(validate_name(name)?);
        fs::File::open(&path)
            .await
            .map_err(|e| DepotError::Storage(format!("cannot open {name:?}: {e}")))
    }

    /// Create a quarantined upload for `user`, making the user's quarantine
    /// directory on first use. Returns the open file and its path so an
    /// aborted transfer can be cleaned up.
    pub async fn create_quarantined(&self, user: &str, name: &str) -> Result<(fs::File, PathBuf)> {
        let dir = self.quarantine_dir.join(user);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DepotError::Storage(format!("cannot create quarantine dir: {e}")))?;

        let path = dir.join(validate_name(name)?);
        let file = fs::File::create(&path)
            .await
            .map_err(|e| DepotError::Storage(format!("cannot create {name:?}: {e}")))?;

        debug!(user, name, "quarantined upload created");
        Ok((file, path))
    }

    /// Remove a partially written quarantine file after an aborted upload.
    pub async fn discard_partial(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove partial upload");
        }
    }

    /// Whether `user` has a quarantined file of this name.
    pub async fn quarantined_exists(&self, user: &str, name: &str) -> Result<bool> {
        let path = self.quarantine_dir.join(user).join(validate_name(name)?);
        Ok(fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false))
    }

    /// Relocate an approved upload into the repository.
    ///
    /// A single rename, never copy+delete: the entry is either fully
    /// published or not published at all.
    // TODO: mutual exclusion on publish path - two REQUESTs for the same
    // filename can interleave with the rename; acceptable at single-operator
    // approval cadence but unguarded.
    pub async fn publish(&self, user: &str, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let src = self.quarantine_dir.join(user).join(name);
        let dst = self.repository_dir.join(name);

        fs::rename(&src, &dst)
            .await
            .map_err(|e| DepotError::Storage(format!("move failed for {name:?}: {e}")))?;

        debug!(user, name, "upload published");
        Ok(())
    }
}
