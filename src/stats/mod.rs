//! Render statistics core
//!
//! Holds raw per-frame stat samples for every loaded sequence and computes
//! the averages shown in the viewer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │  Batch workers  │     │ View Controller │
//! │ (ingest shots)  │     │   (queries)     │
//! └────────┬────────┘     └────────┬────────┘
//!          │ replace_shot          │ Aggregator
//!          └───────────┬───────────┘
//!                      ▼
//!           RwLock<StatStore> + StatCatalog
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let stats = RenderStats::new(StatCatalog::default());
//! stats.replace_shot("Seq010", "Shot020", "1", shot_stats);
//!
//! let avg = stats.with_aggregator(|agg| {
//!     agg.average("render time", "Seq010", Some("Shot020"), None, None)
//! });
//! ```

mod aggregate;
mod catalog;
mod ingest;
mod models;
mod store;

pub use aggregate::Aggregator;
pub use catalog::{DEFAULT_STATS, StatCatalog};
pub use ingest::{ParseError, parse_shot_stats, read_shot_stats};
pub use models::{
    BASELINE_HISTORY, Frame, FrameKey, FrameSamples, MetricSample, ShotStats, StatDefinition,
    StatTotals, StatUnit,
};
pub use store::{StatStore, sort_history_versions};

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle to the stat store and catalog
///
/// Batch workers insert whole shots under the write lock, so readers never
/// observe a half-written shot. Readers may still see a sequence with only
/// some of its shots loaded; callers wait for batch completion before
/// aggregating.
#[derive(Clone)]
pub struct RenderStats {
    store: Arc<RwLock<StatStore>>,
    catalog: Arc<StatCatalog>,
}

impl RenderStats {
    pub fn new(catalog: StatCatalog) -> Self {
        Self {
            store: Arc::new(RwLock::new(StatStore::new())),
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &StatCatalog {
        &self.catalog
    }

    /// Read access to the raw store
    pub fn read(&self) -> RwLockReadGuard<'_, StatStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StatStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace one frame's samples
    pub fn load_frame(
        &self,
        sequence: &str,
        shot: &str,
        render_layer: &str,
        history: &str,
        frame: Frame,
        samples: Vec<MetricSample>,
    ) {
        self.write()
            .load_frame(sequence, shot, render_layer, history, frame, samples);
    }

    /// Atomically replace a shot's data at one history
    pub fn replace_shot(&self, sequence: &str, shot: &str, history: &str, stats: ShotStats) {
        let frames = stats.frame_count();
        self.write().replace_shot(sequence, shot, history, stats);
        tracing::debug!(
            "Loaded {} frames for {}/{} history {}",
            frames,
            sequence,
            shot,
            history
        );
    }

    /// Drop everything loaded for a sequence
    pub fn remove_sequence(&self, sequence: &str) {
        let removed = self.write().remove_sequence(sequence);
        tracing::debug!("Dropped {} frames of {}", removed, sequence);
    }

    pub fn has_data(&self, sequence: &str, shot: Option<&str>) -> bool {
        self.read().has_data(sequence, shot)
    }

    /// Run aggregation queries under a single read lock
    pub fn with_aggregator<R>(&self, f: impl FnOnce(Aggregator<'_>) -> R) -> R {
        let store = self.read();
        f(Aggregator::new(&store, &self.catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_stats_roundtrip() {
        let stats = RenderStats::new(StatCatalog::default());
        let json = r#"{
            "Qian": {
                "1001": { "render time": 10.0, "memory": 4.0, "cpu utilization": 90.0 },
                "1002": { "render time": 12.0, "memory": 6.0, "cpu utilization": 80.0 }
            }
        }"#;
        let shot = parse_shot_stats(json, stats.catalog()).unwrap();
        stats.replace_shot("SeqA", "Sh01", BASELINE_HISTORY, shot);

        assert!(stats.has_data("SeqA", Some("Sh01")));
        let avg = stats.with_aggregator(|agg| {
            agg.average("render time", "SeqA", Some("Sh01"), Some("Qian"), Some("1"))
        });
        assert_eq!(avg, Some(StatTotals::new(11.0, vec![])));

        let memory = stats
            .with_aggregator(|agg| agg.average("memory", "SeqA", None, None, None))
            .unwrap();
        assert_eq!(memory.components.len(), 3);
        assert!((memory.total - 5.0).abs() < 1e-9);
    }
}
