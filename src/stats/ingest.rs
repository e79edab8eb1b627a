//! Stat file ingestion
//!
//! A shot's stat file is a JSON object of `layer -> frame -> stat -> value`:
//!
//! ```json
//! {
//!   "Qian": {
//!     "1001": {
//!       "render time": 10.5,
//!       "memory": { "total": 12.0, "components": { "texture": 6.0, "geometry": 4.0, "cache": 2.0 } },
//!       "cpu utilization": 91.0
//!     }
//!   }
//! }
//! ```
//!
//! Parsing is a pure function of the document and the stat catalog.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::catalog::StatCatalog;
use super::models::{Frame, MetricSample, ShotStats, StatDefinition};

/// Errors produced while turning a stat file into samples
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read stat file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stat file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Render layer {layer} has an invalid frame number: {frame}")]
    InvalidFrame { layer: String, frame: String },

    #[error("Frame {frame} of render layer {layer} is missing stat '{stat}'")]
    MissingStat {
        layer: String,
        frame: Frame,
        stat: String,
    },

    #[error("Stat file contains no frames")]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStatValue {
    Scalar(f64),
    Composite {
        total: f64,
        #[serde(default)]
        components: BTreeMap<String, f64>,
    },
}

type RawStatFile = BTreeMap<String, BTreeMap<String, BTreeMap<String, RawStatValue>>>;

/// Parse a stat file document into samples for every layer and frame
pub fn parse_shot_stats(json: &str, catalog: &StatCatalog) -> Result<ShotStats, ParseError> {
    let raw: RawStatFile = serde_json::from_str(json)?;
    let mut stats = ShotStats::default();

    for (layer, frames) in raw {
        for (frame_name, values) in frames {
            let frame: Frame =
                frame_name
                    .trim()
                    .parse()
                    .map_err(|_| ParseError::InvalidFrame {
                        layer: layer.clone(),
                        frame: frame_name.clone(),
                    })?;

            let samples = frame_samples(&layer, frame, &values, catalog)?;
            stats.frames.insert((layer.clone(), frame), samples);
        }
    }

    if stats.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(stats)
}

/// Read and parse a stat file from disk
pub fn read_shot_stats(path: &Path, catalog: &StatCatalog) -> Result<ShotStats, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_shot_stats(&content, catalog)
}

fn frame_samples(
    layer: &str,
    frame: Frame,
    values: &BTreeMap<String, RawStatValue>,
    catalog: &StatCatalog,
) -> Result<Vec<MetricSample>, ParseError> {
    for name in values.keys() {
        if !catalog.contains(name) {
            tracing::debug!("Ignoring unknown stat '{}' in {} frame {}", name, layer, frame);
        }
    }

    catalog
        .definitions()
        .iter()
        .map(|def| {
            let raw = values.get(&def.name).ok_or_else(|| ParseError::MissingStat {
                layer: layer.to_string(),
                frame,
                stat: def.name.clone(),
            })?;
            Ok(to_sample(def, raw))
        })
        .collect()
}

fn to_sample(def: &StatDefinition, raw: &RawStatValue) -> MetricSample {
    match raw {
        RawStatValue::Scalar(value) => {
            MetricSample::new(def.name.clone(), *value, vec![0.0; def.components.len()])
        }
        RawStatValue::Composite { total, components } => {
            let ordered = def
                .components
                .iter()
                .map(|name| components.get(name).copied().unwrap_or(0.0))
                .collect();
            MetricSample::new(def.name.clone(), *total, ordered)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOT_FILE: &str = r#"{
        "Qian": {
            "1002": {
                "render time": 12.0,
                "memory": { "total": 10.0, "components": { "cache": 1.0, "texture": 6.0 } },
                "cpu utilization": 90.0
            },
            "1001": {
                "render time": 10.0,
                "memory": 8.0,
                "cpu utilization": 80.0,
                "disk io": 3.0
            }
        },
        "Env": {
            "1001": { "render time": 4.0, "memory": 2.0, "cpu utilization": 70.0 }
        }
    }"#;

    #[test]
    fn test_parse_layers_and_frames() {
        let stats = parse_shot_stats(SHOT_FILE, &StatCatalog::default()).unwrap();
        assert_eq!(stats.frame_count(), 3);
        assert_eq!(stats.render_layers(), vec!["Env", "Qian"]);

        let qian_1001 = &stats.frames[&("Qian".to_string(), 1001)];
        assert_eq!(qian_1001.len(), 3, "unknown stats are dropped");
        assert_eq!(qian_1001[0].stat, "render time");
        assert_eq!(qian_1001[0].value, 10.0);
    }

    #[test]
    fn test_components_follow_definition_order() {
        let stats = parse_shot_stats(SHOT_FILE, &StatCatalog::default()).unwrap();
        let memory = stats.frames[&("Qian".to_string(), 1002)]
            .iter()
            .find(|s| s.stat == "memory")
            .unwrap();
        // texture, geometry (missing -> 0), cache
        assert_eq!(memory.components, vec![6.0, 0.0, 1.0]);

        let scalar_memory = stats.frames[&("Qian".to_string(), 1001)]
            .iter()
            .find(|s| s.stat == "memory")
            .unwrap();
        assert_eq!(scalar_memory.components, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_stat_rejects_file() {
        let json = r#"{ "Qian": { "1001": { "render time": 1.0 } } }"#;
        let err = parse_shot_stats(json, &StatCatalog::default()).unwrap_err();
        assert!(matches!(err, ParseError::MissingStat { frame: 1001, .. }));
    }

    #[test]
    fn test_invalid_frame_number() {
        let json = r#"{ "Qian": { "frame_a": { "render time": 1.0 } } }"#;
        let err = parse_shot_stats(json, &StatCatalog::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidFrame { .. }));
    }

    #[test]
    fn test_malformed_and_empty_documents() {
        let catalog = StatCatalog::default();
        assert!(matches!(parse_shot_stats("{ not json", &catalog), Err(ParseError::Json(_))));
        assert!(matches!(parse_shot_stats("{}", &catalog), Err(ParseError::Empty)));
    }
}
