use git2::build::RepoBuilder;
use git2::Repository;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Failed to create a temporary directory for the mirror: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("Failed to clone {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },
    #[error("Failed to remove temporary mirror {path}: {source}")]
    Cleanup {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Clone worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
enum Storage {
    /// Existing checkout owned by the user; never touched
    Local,
    /// Fresh clone, deleted on release or drop
    Temporary(TempDir),
}

/// Full-history copy of the upstream repository for one report run.
///
/// A temporary clone lives exactly as long as this value: dropping it on any
/// path (error, panic unwind, early return) removes the directory.
#[derive(Debug)]
pub struct RepoMirror {
    path: PathBuf,
    storage: Storage,
}

impl RepoMirror {
    /// Reuse `local` when it is a git repository, otherwise clone `clone_url`
    pub async fn acquire(local: Option<&Path>, clone_url: &str) -> Result<Self, MirrorError> {
        if let Some(path) = local {
            match Self::local(path) {
                Some(mirror) => {
                    info!(path = %mirror.path.display(), "Using local repository mirror");
                    return Ok(mirror);
                }
                None => warn!(
                    path = %path.display(),
                    "Local mirror is not a git repository, cloning upstream instead"
                ),
            }
        }
        Self::clone_temporary(clone_url).await
    }

    /// Wrap an existing repository (working tree or bare), if `path` holds one
    pub fn local(path: &Path) -> Option<Self> {
        Repository::open(path).ok()?;
        Some(Self {
            path: path.to_path_buf(),
            storage: Storage::Local,
        })
    }

    pub async fn clone_temporary(clone_url: &str) -> Result<Self, MirrorError> {
        let dir = tempfile::Builder::new()
            .prefix("rw-release-report-")
            .tempdir()
            .map_err(MirrorError::TempDir)?;
        let path = dir.path().join("mirror.git");

        info!(url = clone_url, path = %path.display(), "Cloning repository mirror");
        let url = clone_url.to_string();
        let target = path.clone();
        tokio::task::spawn_blocking(move || RepoBuilder::new().bare(true).clone(&url, &target))
            .await?
            .map_err(|source| MirrorError::Clone {
                url: clone_url.to_string(),
                source,
            })?;

        Ok(Self {
            path,
            storage: Storage::Temporary(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.storage, Storage::Temporary(_))
    }

    /// Remove a temporary clone now, surfacing removal errors that a plain
    /// drop would swallow. Local checkouts are left as they are.
    pub fn release(self) -> Result<(), MirrorError> {
        match self.storage {
            Storage::Local => Ok(()),
            Storage::Temporary(dir) => {
                let path = dir.path().display().to_string();
                dir.close()
                    .map_err(|source| MirrorError::Cleanup { path, source })?;
                info!("Temporary repository mirror removed");
                Ok(())
            }
        }
    }
}
