//! Settings configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::viewer::{DEFAULT_SEQUENCE_PATTERN, DEFAULT_SHOT_PATTERN};

/// Where render data lives on the studio file share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareSettings {
    /// Local mount point of the file share
    #[serde(default = "default_mount")]
    pub mount: PathBuf,

    /// Remote directory holding one folder per sequence
    #[serde(default = "default_root")]
    pub root: String,

    /// Department whose render data is read
    #[serde(default = "default_dept")]
    pub dept: String,

    /// Local cache for downloaded files (defaults to ~/.renderlens/cache)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// Viewer behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSettings {
    /// Maximum concurrent downloads and parses while loading a sequence
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Stat shown on startup (defaults to the first stat in the catalog)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_stat: Option<String>,

    /// Regex matching sequence folder names
    #[serde(default = "default_sequence_pattern")]
    pub sequence_pattern: String,

    /// Regex matching shot folder names
    #[serde(default = "default_shot_pattern")]
    pub shot_pattern: String,
}

fn default_mount() -> PathBuf {
    PathBuf::from("/mnt/studio")
}

fn default_root() -> String {
    "/show/sequences".to_string()
}

fn default_dept() -> String {
    "lighting".to_string()
}

fn default_workers() -> usize {
    8
}

fn default_sequence_pattern() -> String {
    DEFAULT_SEQUENCE_PATTERN.to_string()
}

fn default_shot_pattern() -> String {
    DEFAULT_SHOT_PATTERN.to_string()
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            mount: default_mount(),
            root: default_root(),
            dept: default_dept(),
            cache_dir: None,
        }
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            default_stat: None,
            sequence_pattern: default_sequence_pattern(),
            shot_pattern: default_shot_pattern(),
        }
    }
}
