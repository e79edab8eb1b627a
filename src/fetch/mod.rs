//! Access to render data on the studio file share
//!
//! The viewer only depends on the [`FileFetcher`] contract: copy one remote
//! file into a local directory, or list the entries of a remote directory.
//! [`ShareLayout`] knows where stat files, history folders and frame logs
//! live on the share and where their local copies go.

pub mod batch;
mod share;

pub use batch::{BatchCoordinator, BatchReport, TaskOutcome};
pub use share::LocalShareFetcher;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::stats::{Frame, ParseError};

/// Errors from the file share
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Remote path not found: {0}")]
    NotFound(String),

    #[error("Failed to copy {remote} to {}: {source}", local.display())]
    Copy {
        remote: String,
        local: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list {remote}: {source}")]
    List {
        remote: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File share unavailable: {0}")]
    Unavailable(String),
}

/// Failure of one shot while loading a batch
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Retrieves files and directory listings from the asset share
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Copy a remote file into `local_dir` and return the local path
    async fn fetch(&self, remote: &str, local_dir: &Path) -> Result<PathBuf, FetchError>;

    /// Entry names of a remote directory, sorted
    async fn list(&self, remote_dir: &str) -> Result<Vec<String>, FetchError>;
}

/// Remote and local path conventions for render data
#[derive(Debug, Clone, PartialEq)]
pub struct ShareLayout {
    root: String,
    dept: String,
    cache_dir: PathBuf,
}

impl ShareLayout {
    pub fn new(root: impl Into<String>, dept: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
            dept: dept.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory holding one folder per sequence
    pub fn sequences_dir(&self) -> String {
        self.root.clone()
    }

    /// Directory holding one folder per shot with render data
    pub fn shots_dir(&self, sequence: &str) -> String {
        format!("{}/{}/{}/render_data", self.root, sequence, self.dept)
    }

    /// Directory holding one numbered folder per history version
    pub fn shot_history_dir(&self, sequence: &str, shot: &str) -> String {
        format!("{}/{}", self.shots_dir(sequence), shot)
    }

    /// Stat file of a shot at one history version
    pub fn shot_stats_file(&self, sequence: &str, shot: &str, history: &str) -> String {
        format!(
            "{}/{}/{}_{}.json",
            self.shot_history_dir(sequence, shot),
            history,
            sequence,
            shot
        )
    }

    /// Render log of one frame
    pub fn frame_log_file(
        &self,
        sequence: &str,
        shot: &str,
        render_layer: &str,
        history: &str,
        frame: Frame,
    ) -> String {
        format!(
            "{root}/{seq}/{shot}/{dept}/render_data/{layer}/{history}/{seq}_{shot}_{layer}.{frame}.log",
            root = self.root,
            seq = sequence,
            shot = shot,
            dept = self.dept,
            layer = render_layer,
            history = history,
            frame = frame,
        )
    }

    /// Local directory mirroring the remote file's parent
    pub fn local_dir_for(&self, remote_file: &str) -> PathBuf {
        let parent = remote_file
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or_default();
        parent
            .split('/')
            .filter(|part| !part.is_empty() && *part != "..")
            .fold(self.cache_dir.clone(), |dir, part| dir.join(part))
    }
}
