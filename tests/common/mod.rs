//! Shared test utilities: a render data share in a temp directory

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use renderlens::fetch::{BatchCoordinator, LocalShareFetcher, ShareLayout};
use renderlens::stats::{Frame, RenderStats, StatCatalog};
use renderlens::viewer::ViewController;

pub const ROOT: &str = "/show/sequences";
pub const DEPT: &str = "lighting";

/// One frame's stats in the default catalog
pub fn frame(render_time: f64, memory: f64, cpu: f64) -> Value {
    json!({
        "render time": render_time,
        "memory": {
            "total": memory,
            "components": {
                "texture": memory / 2.0,
                "geometry": memory / 4.0,
                "cache": memory / 4.0
            }
        },
        "cpu utilization": cpu
    })
}

/// File share mounted at a temp directory, plus a local cache directory
pub struct ShareFixture {
    share: TempDir,
    cache: TempDir,
}

impl ShareFixture {
    pub fn new() -> Self {
        Self {
            share: TempDir::new().expect("Failed to create share dir"),
            cache: TempDir::new().expect("Failed to create cache dir"),
        }
    }

    /// Share with Seq010:
    /// Shot010 has Qian (1001, 1002) and Env (1001), history 1 and 2;
    /// Shot020 has Env (1001).
    pub fn with_seq010() -> Self {
        let fixture = Self::new();
        fixture.add_shot(
            "Seq010",
            "Shot010",
            "1",
            json!({
                "Qian": { "1001": frame(10.0, 8.0, 90.0), "1002": frame(12.0, 8.0, 70.0) },
                "Env": { "1001": frame(2.0, 4.0, 50.0) }
            }),
        );
        fixture.add_shot(
            "Seq010",
            "Shot010",
            "2",
            json!({ "Qian": { "1001": frame(20.0, 16.0, 95.0) } }),
        );
        fixture.add_shot(
            "Seq010",
            "Shot020",
            "1",
            json!({ "Env": { "1001": frame(6.0, 4.0, 60.0) } }),
        );
        fixture
    }

    pub fn layout(&self) -> ShareLayout {
        ShareLayout::new(ROOT, DEPT, self.cache.path())
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats::new(StatCatalog::default())
    }

    pub fn controller(&self) -> ViewController {
        ViewController::new(
            self.stats(),
            Arc::new(LocalShareFetcher::new(self.share.path())),
            self.layout(),
        )
        .with_batch(BatchCoordinator::new(2))
    }

    /// Local path of a remote path on the share
    pub fn local(&self, remote: &str) -> PathBuf {
        remote
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.share.path().to_path_buf(), |path, part| path.join(part))
    }

    pub fn add_shot(&self, sequence: &str, shot: &str, history: &str, stats: Value) {
        let path = self.local(&self.layout().shot_stats_file(sequence, shot, history));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, stats.to_string()).unwrap();
    }

    /// Shot folder with a baseline history folder but no stat file
    pub fn add_shot_without_stats(&self, sequence: &str, shot: &str) {
        self.add_history_dir(sequence, shot, "1");
    }

    pub fn add_history_dir(&self, sequence: &str, shot: &str, history: &str) {
        let dir = self.local(&self.layout().shot_history_dir(sequence, shot));
        fs::create_dir_all(dir.join(history)).unwrap();
    }

    pub fn add_frame_log(
        &self,
        sequence: &str,
        shot: &str,
        layer: &str,
        history: &str,
        frame: Frame,
        content: &str,
    ) {
        let path = self.local(&self.layout().frame_log_file(sequence, shot, layer, history, frame));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Delete everything below the sequence folder
    pub fn remove_sequence(&self, sequence: &str) {
        fs::remove_dir_all(self.local(&format!("{}/{}", ROOT, sequence))).unwrap();
    }

    pub fn write_user_file(&self, name: &str, stats: Value) -> PathBuf {
        let path = self.cache.path().join("user").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, stats.to_string()).unwrap();
        path
    }
}
