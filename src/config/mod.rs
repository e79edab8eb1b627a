//! Configuration loading and management

mod io;
mod settings;

pub use io::{LOCAL_CONFIG_PATH, write_locked};
pub use settings::{ShareSettings, ViewerSettings};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fetch::ShareLayout;
use crate::stats::{DEFAULT_STATS, StatCatalog, StatDefinition};
use crate::viewer::NamingRules;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// File share location
    #[serde(default)]
    pub share: ShareSettings,

    /// Viewer settings
    #[serde(default)]
    pub viewer: ViewerSettings,

    /// Stat catalog; empty means the built-in stats
    #[serde(default)]
    pub stat: Vec<StatDefinition>,
}

impl Config {
    /// Create a config with the built-in stat catalog spelled out
    pub fn with_defaults() -> Self {
        Self {
            stat: DEFAULT_STATS.clone(),
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> StatCatalog {
        if self.stat.is_empty() {
            StatCatalog::default()
        } else {
            StatCatalog::new(self.stat.clone())
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.share
            .cache_dir
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("cache"))
    }

    pub fn layout(&self) -> ShareLayout {
        ShareLayout::new(&self.share.root, &self.share.dept, self.cache_dir())
    }

    pub fn naming(&self) -> Result<NamingRules, regex::Error> {
        NamingRules::new(&self.viewer.sequence_pattern, &self.viewer.shot_pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatUnit;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.share.dept, "lighting");
        assert_eq!(config.viewer.workers, 8);
        assert_eq!(config.catalog().len(), DEFAULT_STATS.len());
        assert!(config.naming().unwrap().is_shot("Shot010"));
    }

    #[test]
    fn test_custom_stat_catalog() {
        let config: Config = toml::from_str(
            r#"
            [share]
            root = "/proj/seq"
            cache_dir = "/tmp/rl"

            [[stat]]
            name = "gpu time"
            unit = "time"

            [[stat]]
            name = "disk"
            unit = "size"
            components = ["cache", "output"]
            "#,
        )
        .unwrap();

        let catalog = config.catalog();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["gpu time", "disk"]);
        assert_eq!(catalog.get("disk").unwrap().unit, StatUnit::Size);
        assert_eq!(
            config.layout().shots_dir("Seq010"),
            "/proj/seq/Seq010/lighting/render_data"
        );
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/rl"));
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let mut config = Config::default();
        config.viewer.shot_pattern = "(".to_string();
        assert!(config.naming().is_err());
    }
}
