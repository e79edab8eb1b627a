//! In-memory stat store
//!
//! Raw per-frame samples keyed by a single flattened
//! `(sequence, shot, render layer, history, frame)` key. Because the key is
//! ordered, every scope query is a range scan and frames come out ascending.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::models::{Frame, FrameKey, FrameSamples, MetricSample, ShotStats};

/// Raw stat samples for every loaded frame
#[derive(Debug, Clone, Default)]
pub struct StatStore {
    frames: BTreeMap<FrameKey, FrameSamples>,
}

impl StatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace all samples for one frame key. Last write wins.
    pub fn load_frame(
        &mut self,
        sequence: &str,
        shot: &str,
        render_layer: &str,
        history: &str,
        frame: Frame,
        samples: Vec<MetricSample>,
    ) {
        let key = FrameKey::new(sequence, shot, render_layer, history, frame);
        self.frames.insert(key, to_frame_samples(samples));
    }

    /// Replace a shot's frames at one history, all render layers at once.
    ///
    /// Frames of other histories are kept.
    pub fn replace_shot(&mut self, sequence: &str, shot: &str, history: &str, stats: ShotStats) {
        let stale: Vec<FrameKey> = self
            .scope(sequence, Some(shot))
            .filter(|(key, _)| key.history == history)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            self.frames.remove(&key);
        }

        for ((render_layer, frame), samples) in stats.frames {
            let key = FrameKey::new(sequence, shot, render_layer, history, frame);
            self.frames.insert(key, to_frame_samples(samples));
        }
    }

    /// Drop every frame of a sequence, returning how many were removed
    pub fn remove_sequence(&mut self, sequence: &str) -> usize {
        let stale: Vec<FrameKey> = self
            .scope(sequence, None)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.frames.remove(key);
        }
        stale.len()
    }

    /// Whether any frame is loaded for the sequence, or for one of its shots
    pub fn has_data(&self, sequence: &str, shot: Option<&str>) -> bool {
        self.scope(sequence, shot).next().is_some()
    }

    /// Shots of a sequence, optionally only those containing `render_layer`
    pub fn list_shots(&self, sequence: &str, render_layer: Option<&str>) -> Vec<String> {
        let mut shots: Vec<String> = Vec::new();
        for (key, _) in self.scope(sequence, None) {
            if render_layer.is_some_and(|layer| key.render_layer != layer) {
                continue;
            }
            if shots.last() != Some(&key.shot) {
                shots.push(key.shot.clone());
            }
        }
        shots
    }

    /// Render layers present at a sequence or shot scope for one history
    pub fn list_render_layers(
        &self,
        sequence: &str,
        shot: Option<&str>,
        history: &str,
    ) -> Vec<String> {
        let mut layers: Vec<String> = self
            .scope(sequence, shot)
            .filter(|(key, _)| key.history == history)
            .map(|(key, _)| key.render_layer.clone())
            .collect();
        layers.sort();
        layers.dedup();
        layers
    }

    /// History versions loaded for a (shot, render layer) pair
    pub fn list_history_versions(
        &self,
        sequence: &str,
        shot: &str,
        render_layer: &str,
    ) -> Vec<String> {
        let mut versions: Vec<String> = self
            .scope(sequence, Some(shot))
            .filter(|(key, _)| key.render_layer == render_layer)
            .map(|(key, _)| key.history.clone())
            .collect();
        sort_history_versions(&mut versions);
        versions
    }

    /// Frames of one layer at one history, ascending
    pub fn list_frames(
        &self,
        sequence: &str,
        shot: &str,
        render_layer: &str,
        history: &str,
    ) -> Vec<Frame> {
        let lower = FrameKey::new(sequence, shot, render_layer, history, Frame::MIN);
        self.frames
            .range(lower..)
            .take_while(|(key, _)| {
                key.sequence == sequence
                    && key.shot == shot
                    && key.render_layer == render_layer
                    && key.history == history
            })
            .map(|(key, _)| key.frame)
            .collect()
    }

    pub fn samples(&self, key: &FrameKey) -> Option<&FrameSamples> {
        self.frames.get(key)
    }

    pub fn sample(&self, key: &FrameKey, stat: &str) -> Option<&MetricSample> {
        self.frames.get(key).and_then(|samples| samples.get(stat))
    }

    /// Number of loaded frame keys
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Keys belonging to a sequence (and shot, if given), in key order
    fn scope<'a>(
        &'a self,
        sequence: &'a str,
        shot: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a FrameKey, &'a FrameSamples)> + 'a {
        let lower = FrameKey::new(sequence, shot.unwrap_or(""), "", "", Frame::MIN);
        self.frames.range(lower..).take_while(move |(key, _)| {
            key.sequence == sequence && shot.is_none_or(|shot| key.shot == shot)
        })
    }
}

fn to_frame_samples(samples: Vec<MetricSample>) -> FrameSamples {
    samples
        .into_iter()
        .map(|sample| (sample.stat.clone(), sample))
        .collect()
}

/// Sort history names numerically; non-numeric names go last, lexically.
pub fn sort_history_versions(versions: &mut Vec<String>) {
    versions.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    versions.dedup();
}
