//! CLI command implementations

pub mod catalog;
pub mod custom;
pub mod init;
pub mod view;

use anyhow::Result;
use std::path::Path;

use renderlens::config::Config;

/// Load the config given with --config, or look it up from the working directory
pub fn load_config(work_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::from_file(path),
        None => Config::from_dir(work_dir),
    }
}
