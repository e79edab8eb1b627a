//! Custom data command implementation

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use renderlens::config::Config;
use renderlens::viewer::{LayerFilter, TextSink, ViewController, ViewUpdate};

/// Expand glob patterns (relative to `work_dir`) into stat files
pub fn expand_patterns(work_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let full_pattern = if Path::new(pattern).is_absolute() {
            pattern.clone()
        } else {
            format!("{}/{}", work_dir.display(), pattern)
        };
        let paths = glob::glob(&full_pattern)
            .with_context(|| format!("Invalid file pattern: {}", pattern))?;
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable path: {}", e),
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Show user-supplied stat files in the custom view
pub async fn custom_command(
    config: &Config,
    work_dir: &Path,
    patterns: &[String],
    layer: Option<String>,
    stat: Option<String>,
) -> Result<()> {
    let files = expand_patterns(work_dir, patterns)?;
    if files.is_empty() {
        bail!("No stat files match {}", patterns.join(" "));
    }

    let mut controller = ViewController::from_config(config)?;
    let mut sink = TextSink::new(std::io::stdout());
    let mut notices = Vec::new();

    if let Some(stat) = &stat {
        notices.extend(controller.set_stat(stat).notices);
    }
    notices.extend(controller.load_custom_data(files).await.notices);
    if !controller.nav().is_custom() {
        for notice in &notices {
            eprintln!("{}", notice);
        }
        bail!("None of the stat files could be loaded");
    }
    if let Some(layer) = layer {
        notices.extend(controller.set_layer(LayerFilter::from_menu(&layer)).await.notices);
    }

    let update = ViewUpdate {
        notices,
        ..Default::default()
    };
    controller.present(&update, &mut sink);
    Ok(())
}
