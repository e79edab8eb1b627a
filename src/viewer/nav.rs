//! Drill-down navigation state
//!
//! `NavState` is an immutable snapshot. Every transition returns a new
//! value; the controller swaps it in and diffs old against new to decide
//! what to rebuild.

use serde::{Deserialize, Serialize};

use crate::stats::BASELINE_HISTORY;

/// Menu entry meaning "combine every render layer"
pub const ALL_RENDER_LAYERS: &str = "All Render Layers";

/// Synthetic sequence used for user-supplied data
pub const CUSTOM_SEQUENCE: &str = "Seq000";

/// Synthetic shot used for user-supplied data
pub const CUSTOM_SHOT: &str = "Shot000";

/// Drill-down level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Bars are shots
    Sequence,
    /// Bars are frames
    Shot,
}

impl Level {
    /// What one bar of the chart represents
    pub fn axis_label(&self) -> &'static str {
        match self {
            Level::Sequence => "Shot",
            Level::Shot => "Frame",
        }
    }
}

/// Render layer filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayerFilter {
    #[default]
    All,
    Layer(String),
}

impl LayerFilter {
    /// Parse a menu entry
    pub fn from_menu(entry: &str) -> Self {
        if entry == ALL_RENDER_LAYERS {
            LayerFilter::All
        } else {
            LayerFilter::Layer(entry.to_string())
        }
    }

    pub fn as_layer(&self) -> Option<&str> {
        match self {
            LayerFilter::All => None,
            LayerFilter::Layer(layer) => Some(layer.as_str()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, LayerFilter::All)
    }
}

impl std::fmt::Display for LayerFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerFilter::All => write!(f, "{}", ALL_RENDER_LAYERS),
            LayerFilter::Layer(layer) => write!(f, "{}", layer),
        }
    }
}

/// Rejected navigation input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("No sequence selected")]
    NoSequence,

    #[error("No shot selected")]
    NoShot,

    #[error("History can only be changed for a single render layer of a shot")]
    HistoryNotSelectable,

    #[error("Custom data can not be navigated")]
    CustomData,

    #[error("Unknown stat: {0}")]
    UnknownStat(String),

    #[error("Unknown render layer: {0}")]
    UnknownRenderLayer(String),

    #[error("Could not update graph. {0} is not a valid x axis value")]
    InvalidAxisValue(String),
}

/// One breadcrumb entry above the chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    /// Clicking the crumb navigates back to the sequence view
    pub links_to_sequence: bool,
}

/// Which parts of the view changed between two snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavChange {
    pub level: bool,
    pub scope: bool,
    pub layer: bool,
    pub history: bool,
    pub stat: bool,
}

impl NavChange {
    pub fn is_empty(&self) -> bool {
        *self == NavChange::default()
    }

    /// The render layer menu has to be rebuilt
    pub fn layer_menu(&self) -> bool {
        self.level || self.scope
    }

    /// The history menu has to be rebuilt
    pub fn history_menu(&self) -> bool {
        self.level || self.scope || self.layer
    }

    pub fn merge(self, other: NavChange) -> NavChange {
        NavChange {
            level: self.level || other.level,
            scope: self.scope || other.scope,
            layer: self.layer || other.layer,
            history: self.history || other.history,
            stat: self.stat || other.stat,
        }
    }
}

/// Snapshot of where the user is in the data
#[derive(Debug, Clone, PartialEq)]
pub struct NavState {
    level: Level,
    sequence: Option<String>,
    shot: Option<String>,
    layer: LayerFilter,
    history: String,
    stat: String,
    custom: bool,
}

impl NavState {
    /// Start state: sequence view with nothing selected
    pub fn new(stat: impl Into<String>) -> Self {
        Self {
            level: Level::Sequence,
            sequence: None,
            shot: None,
            layer: LayerFilter::All,
            history: BASELINE_HISTORY.to_string(),
            stat: stat.into(),
            custom: false,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    pub fn shot(&self) -> Option<&str> {
        self.shot.as_deref()
    }

    pub fn layer(&self) -> &LayerFilter {
        &self.layer
    }

    pub fn stat(&self) -> &str {
        &self.stat
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// History can be picked only for one layer of a real shot
    pub fn history_selectable(&self) -> bool {
        self.level == Level::Shot && !self.layer.is_all() && !self.custom
    }

    /// History to query with; the baseline whenever history is not selectable
    pub fn history(&self) -> &str {
        if self.history_selectable() {
            &self.history
        } else {
            BASELINE_HISTORY
        }
    }

    /// Selecting a sequence always lands in its sequence view
    pub fn select_sequence(&self, sequence: impl Into<String>) -> NavState {
        NavState {
            sequence: Some(sequence.into()),
            ..NavState::new(self.stat.clone())
        }
    }

    /// Drill into one shot of the active sequence
    pub fn enter_shot(&self, shot: impl Into<String>) -> Result<NavState, NavError> {
        if self.custom {
            return Err(NavError::CustomData);
        }
        let sequence = self.sequence.clone().ok_or(NavError::NoSequence)?;
        Ok(NavState {
            level: Level::Shot,
            sequence: Some(sequence),
            shot: Some(shot.into()),
            ..NavState::new(self.stat.clone())
        })
    }

    /// Breadcrumb back to the sequence view
    pub fn back_to_sequence(&self) -> Result<NavState, NavError> {
        if self.custom {
            return Err(NavError::CustomData);
        }
        let sequence = self.sequence.clone().ok_or(NavError::NoSequence)?;
        Ok(self.select_sequence(sequence))
    }

    /// Change the render layer filter; history falls back to the baseline
    pub fn with_layer(&self, layer: LayerFilter) -> NavState {
        NavState {
            layer,
            history: BASELINE_HISTORY.to_string(),
            ..self.clone()
        }
    }

    pub fn with_history(&self, history: impl Into<String>) -> Result<NavState, NavError> {
        if !self.history_selectable() {
            return Err(NavError::HistoryNotSelectable);
        }
        Ok(NavState {
            history: history.into(),
            ..self.clone()
        })
    }

    pub fn with_stat(&self, stat: impl Into<String>) -> NavState {
        NavState {
            stat: stat.into(),
            ..self.clone()
        }
    }

    /// Shot view over user-supplied data, history pinned to the baseline
    pub fn custom_view(&self) -> NavState {
        NavState {
            level: Level::Shot,
            sequence: Some(CUSTOM_SEQUENCE.to_string()),
            shot: Some(CUSTOM_SHOT.to_string()),
            custom: true,
            ..NavState::new(self.stat.clone())
        }
    }

    /// What differs between `self` and `next`
    pub fn diff(&self, next: &NavState) -> NavChange {
        NavChange {
            level: self.level != next.level || self.custom != next.custom,
            scope: self.sequence != next.sequence || self.shot != next.shot,
            layer: self.layer != next.layer,
            history: self.history() != next.history(),
            stat: self.stat != next.stat,
        }
    }

    /// Breadcrumb shown above the chart
    pub fn breadcrumb(&self) -> Vec<Crumb> {
        if self.custom {
            return vec![Crumb {
                label: "User Custom Data".to_string(),
                links_to_sequence: false,
            }];
        }
        let Some(sequence) = &self.sequence else {
            return Vec::new();
        };
        match (&self.level, &self.shot) {
            (Level::Shot, Some(shot)) => vec![
                Crumb {
                    label: sequence.clone(),
                    links_to_sequence: true,
                },
                Crumb {
                    label: shot.clone(),
                    links_to_sequence: false,
                },
            ],
            _ => vec![Crumb {
                label: sequence.clone(),
                links_to_sequence: false,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_sequence() -> NavState {
        NavState::new("render time").select_sequence("SeqA")
    }

    #[test]
    fn test_select_sequence_resets_to_sequence_view() {
        let shot_view = in_sequence()
            .enter_shot("Sh01")
            .unwrap()
            .with_layer(LayerFilter::Layer("Qian".into()))
            .with_history("2")
            .unwrap();

        let next = shot_view.select_sequence("SeqB");
        assert_eq!(next.level(), Level::Sequence);
        assert_eq!(next.sequence(), Some("SeqB"));
        assert_eq!(next.shot(), None);
        assert!(next.layer().is_all());
        assert_eq!(next.history(), "1");
        assert_eq!(next.stat(), "render time");
    }

    #[test]
    fn test_enter_shot_defaults() {
        let shot_view = in_sequence().enter_shot("Sh01").unwrap();
        assert_eq!(shot_view.level(), Level::Shot);
        assert_eq!(shot_view.shot(), Some("Sh01"));
        assert!(shot_view.layer().is_all());
        assert_eq!(shot_view.history(), "1");
        assert!(!shot_view.history_selectable());
    }

    #[test]
    fn test_enter_shot_requires_sequence() {
        let err = NavState::new("render time").enter_shot("Sh01").unwrap_err();
        assert_eq!(err, NavError::NoSequence);
    }

    #[test]
    fn test_history_only_for_concrete_layer_in_shot_view() {
        let seq_view = in_sequence().with_layer(LayerFilter::Layer("Qian".into()));
        assert_eq!(seq_view.with_history("2"), Err(NavError::HistoryNotSelectable));

        let all_layers = in_sequence().enter_shot("Sh01").unwrap();
        assert_eq!(all_layers.with_history("2"), Err(NavError::HistoryNotSelectable));

        let one_layer = all_layers.with_layer(LayerFilter::Layer("Qian".into()));
        assert!(one_layer.history_selectable());
        let with_history = one_layer.with_history("2").unwrap();
        assert_eq!(with_history.history(), "2");

        // back to all layers pins the baseline again
        let back = with_history.with_layer(LayerFilter::All);
        assert_eq!(back.history(), "1");
    }

    #[test]
    fn test_back_to_sequence_clears_shot() {
        let shot_view = in_sequence()
            .enter_shot("Sh01")
            .unwrap()
            .with_layer(LayerFilter::Layer("Qian".into()));
        let back = shot_view.back_to_sequence().unwrap();
        assert_eq!(back.level(), Level::Sequence);
        assert_eq!(back.shot(), None);
        assert!(back.layer().is_all());
        assert!(!back.history_selectable());
    }

    #[test]
    fn test_custom_view_pins_history() {
        let custom = in_sequence().custom_view();
        assert_eq!(custom.level(), Level::Shot);
        assert_eq!(custom.sequence(), Some(CUSTOM_SEQUENCE));
        assert_eq!(custom.shot(), Some(CUSTOM_SHOT));
        let one_layer = custom.with_layer(LayerFilter::Layer("Qian".into()));
        assert!(!one_layer.history_selectable());
        assert_eq!(one_layer.with_history("2"), Err(NavError::HistoryNotSelectable));
        assert_eq!(custom.enter_shot("Sh01"), Err(NavError::CustomData));
    }

    #[test]
    fn test_diff_reports_changes() {
        let seq_view = in_sequence();
        let shot_view = seq_view.enter_shot("Sh01").unwrap();
        let change = seq_view.diff(&shot_view);
        assert!(change.level && change.scope);
        assert!(!change.stat);
        assert!(change.layer_menu() && change.history_menu());

        let stat_change = shot_view.diff(&shot_view.with_stat("memory"));
        assert_eq!(
            stat_change,
            NavChange {
                stat: true,
                ..Default::default()
            }
        );
        assert!(shot_view.diff(&shot_view.clone()).is_empty());
    }

    #[test]
    fn test_breadcrumb() {
        let seq_view = in_sequence();
        assert_eq!(seq_view.breadcrumb().len(), 1);
        assert!(!seq_view.breadcrumb()[0].links_to_sequence);

        let crumbs = seq_view.enter_shot("Sh01").unwrap().breadcrumb();
        assert_eq!(crumbs[0].label, "SeqA");
        assert!(crumbs[0].links_to_sequence);
        assert_eq!(crumbs[1].label, "Sh01");

        assert_eq!(seq_view.custom_view().breadcrumb()[0].label, "User Custom Data");
        assert!(NavState::new("render time").breadcrumb().is_empty());
    }
}
