//! Init command implementation

use anyhow::{Result, bail};
use std::path::PathBuf;
use tracing::info;

use renderlens::config::{Config, write_locked};

/// Default configuration content for renderlens init
pub const DEFAULT_CONFIG: &str = r#"# renderlens configuration
# =======================
#
# Render statistics are read from the studio file share. Each shot's stat
# file lives at:
#
#   {root}/{sequence}/{dept}/render_data/{shot}/{history}/{sequence}_{shot}.json

# ============================================================================
# SHARE - Where render data lives
# ============================================================================
#
#   mount      - Local mount point of the file share
#   root       - Directory (on the share) holding one folder per sequence
#   dept       - Department whose render data is read
#   cache_dir  - Local copy of downloaded files (default: ~/.renderlens/cache)

[share]
mount = "/mnt/studio"
root = "/show/sequences"
dept = "lighting"
# cache_dir = "/tmp/renderlens"

# ============================================================================
# VIEWER
# ============================================================================
#
#   workers          - Concurrent downloads/parses while loading a sequence
#   default_stat     - Stat shown first (default: first [[stat]] entry)
#   sequence_pattern - Regex for sequence folder names
#   shot_pattern     - Regex for shot folder names

[viewer]
workers = 8
# default_stat = "render time"
sequence_pattern = '^Seq\d{3}$'
shot_pattern = '^Shot\d{3}[A-Za-z]?$'

# ============================================================================
# STATS - What every frame of a stat file must contain
# ============================================================================
#
#   name        - Key used in the stat files
#   unit        - "time" (minutes), "size" (gigabytes) or "ratio" (percent)
#   components  - Named parts of the total, in display order (optional)
#
# Ratio stats are averaged across render layers; time and size are summed.

[[stat]]
name = "render time"
unit = "time"

[[stat]]
name = "memory"
unit = "size"
components = ["texture", "geometry", "cache"]

[[stat]]
name = "cpu utilization"
unit = "ratio"
"#;

/// Initialize a new renderlens configuration
/// By default creates the global config at ~/.renderlens/config.toml
/// Use --config to specify a custom path
pub async fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    write_locked(&config_path, DEFAULT_CONFIG)?;
    info!("Wrote default config to {}", config_path.display());
    println!("Created: {}", config_path.display());

    Ok(())
}
