//! Stat aggregation at frame, shot and sequence granularity
//!
//! When the render layer filter is "all", layers are combined per frame:
//! values are summed, except ratio stats which are averaged. Layers rarely
//! render the same frame range, so the combined x axis is taken from the
//! layer with the most frames and a layer missing one of those frames
//! contributes its first available frame instead.

use super::catalog::StatCatalog;
use super::models::{BASELINE_HISTORY, Frame, FrameKey, MetricSample, StatDefinition, StatTotals};
use super::store::StatStore;

/// Read-only aggregation view over a store and catalog
#[derive(Clone, Copy)]
pub struct Aggregator<'a> {
    store: &'a StatStore,
    catalog: &'a StatCatalog,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a StatStore, catalog: &'a StatCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &'a StatStore {
        self.store
    }

    /// Raw value and breakdown of a stat for exactly one frame
    pub fn totals(
        &self,
        stat: &str,
        sequence: &str,
        shot: &str,
        render_layer: &str,
        frame: Frame,
        history: &str,
    ) -> Option<StatTotals> {
        let def = self.catalog.get(stat)?;
        let key = FrameKey::new(sequence, shot, render_layer, history, frame);
        self.store.sample(&key, stat).map(|sample| normalized(def, sample))
    }

    /// Per-frame values of a single render layer
    pub fn layer_frames(
        &self,
        stat: &str,
        sequence: &str,
        shot: &str,
        render_layer: &str,
        history: &str,
    ) -> Vec<(Frame, StatTotals)> {
        self.store
            .list_frames(sequence, shot, render_layer, history)
            .into_iter()
            .filter_map(|frame| {
                self.totals(stat, sequence, shot, render_layer, frame, history)
                    .map(|totals| (frame, totals))
            })
            .collect()
    }

    /// Per-frame values with every render layer of the shot combined
    pub fn combined_frames(
        &self,
        stat: &str,
        sequence: &str,
        shot: &str,
        history: &str,
    ) -> Vec<(Frame, StatTotals)> {
        let Some(def) = self.catalog.get(stat) else {
            return Vec::new();
        };

        let layer_frames: Vec<(String, Vec<Frame>)> = self
            .store
            .list_render_layers(sequence, Some(shot), history)
            .into_iter()
            .map(|layer| {
                let frames = self.store.list_frames(sequence, shot, &layer, history);
                (layer, frames)
            })
            .collect();

        let mut axis: &[Frame] = &[];
        for (_, frames) in &layer_frames {
            if frames.len() > axis.len() {
                axis = frames;
            }
        }

        let mut combined = Vec::with_capacity(axis.len());
        for &frame in axis {
            let mut totals = StatTotals::zeroed(def.components.len());
            let mut layers = 0;
            for (layer, frames) in &layer_frames {
                let source = if frames.binary_search(&frame).is_ok() {
                    frame
                } else {
                    match frames.first() {
                        Some(&first) => first,
                        None => continue,
                    }
                };
                if let Some(layer_totals) =
                    self.totals(stat, sequence, shot, layer, source, history)
                {
                    totals.accumulate(&layer_totals);
                    layers += 1;
                }
            }
            if layers == 0 {
                continue;
            }
            if def.unit.averages_across_layers() {
                totals = totals.scaled_down(layers);
            }
            combined.push((frame, totals));
        }
        combined
    }

    /// Average of a stat over the requested scope.
    ///
    /// - no shot, no layer: mean of every shot's combined average
    /// - no shot, layer: mean over shots containing the layer
    /// - shot, no layer: mean over the combined frames of the shot
    /// - shot and layer: mean over that layer's frames
    ///
    /// History defaults to the baseline version. Returns `None` when the
    /// scope holds no data or the stat is unknown.
    pub fn average(
        &self,
        stat: &str,
        sequence: &str,
        shot: Option<&str>,
        render_layer: Option<&str>,
        history: Option<&str>,
    ) -> Option<StatTotals> {
        let def = self.catalog.get(stat)?;
        let width = def.components.len();
        let history = history.unwrap_or(BASELINE_HISTORY);

        match (shot, render_layer) {
            (Some(shot), Some(layer)) => mean(
                self.layer_frames(stat, sequence, shot, layer, history)
                    .into_iter()
                    .map(|(_, totals)| totals),
                width,
            ),
            (Some(shot), None) => mean(
                self.combined_frames(stat, sequence, shot, history)
                    .into_iter()
                    .map(|(_, totals)| totals),
                width,
            ),
            (None, layer) => mean(
                self.store
                    .list_shots(sequence, layer)
                    .iter()
                    .filter_map(|shot| {
                        self.average(stat, sequence, Some(shot.as_str()), layer, Some(history))
                    }),
                width,
            ),
        }
    }
}

/// Copy a sample, forcing the component list to the definition's length
fn normalized(def: &StatDefinition, sample: &MetricSample) -> StatTotals {
    let mut components = sample.components.clone();
    components.resize(def.components.len(), 0.0);
    StatTotals::new(sample.value, components)
}

fn mean(values: impl Iterator<Item = StatTotals>, width: usize) -> Option<StatTotals> {
    let mut sum = StatTotals::zeroed(width);
    let mut count = 0;
    for value in values {
        sum.accumulate(&value);
        count += 1;
    }
    (count > 0).then(|| sum.scaled_down(count))
}
