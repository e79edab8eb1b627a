//! Render statistics data models
//!
//! These types describe stat definitions, raw per-frame samples and the
//! aggregated values handed to the chart and sidebar.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Frame number as written by the renderer (e.g. 1001)
pub type Frame = u32;

/// History version used whenever history has no meaning for the current view
pub const BASELINE_HISTORY: &str = "1";

/// Unit tag of a stat, drives axis labels and colour choice only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatUnit {
    /// Durations, displayed in minutes
    Time,
    /// Memory and disk sizes, displayed in gigabytes
    Size,
    /// Percentages such as cpu utilization
    Ratio,
}

impl StatUnit {
    /// Short suffix shown next to values in the sidebar
    pub fn suffix(&self) -> &'static str {
        match self {
            StatUnit::Time => "min",
            StatUnit::Size => "gb",
            StatUnit::Ratio => "%",
        }
    }

    /// Y axis label for the bar chart
    pub fn axis_label(&self) -> &'static str {
        match self {
            StatUnit::Time => "minutes (min)",
            StatUnit::Size => "gigabytes (gb)",
            StatUnit::Ratio => "percent (%)",
        }
    }

    /// Whether combining render layers averages instead of sums.
    ///
    /// Two layers at 90% utilization are 90%, not 180%.
    pub fn averages_across_layers(&self) -> bool {
        matches!(self, StatUnit::Ratio)
    }
}

impl std::fmt::Display for StatUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Static metadata for one stat name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDefinition {
    pub name: String,
    pub unit: StatUnit,
    /// Ordered component names, empty for atomic stats
    #[serde(default)]
    pub components: Vec<String>,
}

impl StatDefinition {
    pub fn new(name: impl Into<String>, unit: StatUnit, components: &[&str]) -> Self {
        Self {
            name: name.into(),
            unit,
            components: components.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn is_atomic(&self) -> bool {
        self.components.is_empty()
    }
}

/// One frame's recorded value for a named stat
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub stat: String,
    pub value: f64,
    /// Component values, ordered like the stat definition's component names
    pub components: Vec<f64>,
}

impl MetricSample {
    pub fn new(stat: impl Into<String>, value: f64, components: Vec<f64>) -> Self {
        Self {
            stat: stat.into(),
            value,
            components,
        }
    }

    /// Sample for an atomic stat
    pub fn atomic(stat: impl Into<String>, value: f64) -> Self {
        Self::new(stat, value, Vec::new())
    }
}

/// All samples of one frame, keyed by stat name
pub type FrameSamples = BTreeMap<String, MetricSample>;

/// Flattened stat store key
///
/// Field order matters: the derived ordering groups keys by sequence, then
/// shot, layer and history, with frames ascending inside each group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameKey {
    pub sequence: String,
    pub shot: String,
    pub render_layer: String,
    pub history: String,
    pub frame: Frame,
}

impl FrameKey {
    pub fn new(
        sequence: impl Into<String>,
        shot: impl Into<String>,
        render_layer: impl Into<String>,
        history: impl Into<String>,
        frame: Frame,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            shot: shot.into(),
            render_layer: render_layer.into(),
            history: history.into(),
            frame,
        }
    }
}

/// A stat total together with its component breakdown
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatTotals {
    pub total: f64,
    pub components: Vec<f64>,
}

impl StatTotals {
    pub fn new(total: f64, components: Vec<f64>) -> Self {
        Self { total, components }
    }

    pub fn zeroed(width: usize) -> Self {
        Self {
            total: 0.0,
            components: vec![0.0; width],
        }
    }

    /// Add another value in place, component by component
    pub(crate) fn accumulate(&mut self, other: &StatTotals) {
        self.total += other.total;
        for (acc, value) in self.components.iter_mut().zip(&other.components) {
            *acc += value;
        }
    }

    /// Divide total and components by `count`; no-op for zero
    pub(crate) fn scaled_down(mut self, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        let divisor = count as f64;
        self.total /= divisor;
        for value in &mut self.components {
            *value /= divisor;
        }
        self
    }
}

/// Parsed contents of one shot's stat file: `(layer, frame)` → samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotStats {
    pub frames: BTreeMap<(String, Frame), Vec<MetricSample>>,
}

impl ShotStats {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Render layer names present in the file
    pub fn render_layers(&self) -> Vec<String> {
        let mut layers: Vec<String> = self.frames.keys().map(|(layer, _)| layer.clone()).collect();
        layers.dedup();
        layers
    }

    /// Merge another file's frames in, later frames win
    pub fn merge(&mut self, other: ShotStats) {
        self.frames.extend(other.frames);
    }
}
