//! View Controller
//!
//! Turns user input (menu picks, breadcrumb clicks, chart clicks) into
//! navigation transitions. Sequence loads go through the batch coordinator:
//! every shot file is fetched, then parsed off the async runtime, and only
//! then inserted into the store. The finished view is handed to a
//! [`DisplaySink`] together with any notices the action produced.

mod chart;
mod nav;
mod naming;
mod sink;

pub use chart::{
    AverageSidebar, BarColors, COOL_PALETTE, Chart, RATIO_COLOR, Rgb, SidebarEntry, TOTAL_COLOR,
    WARM_PALETTE, build_chart, build_sidebar, component_color, format_average,
};
pub use nav::{
    ALL_RENDER_LAYERS, CUSTOM_SEQUENCE, CUSTOM_SHOT, Crumb, LayerFilter, Level, NavChange,
    NavError, NavState,
};
pub use naming::{AxisValue, DEFAULT_SEQUENCE_PATTERN, DEFAULT_SHOT_PATTERN, NamingRules};
pub use sink::{DisplaySink, Notice, Severity, TextSink, ViewFrame};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::fetch::{
    BatchCoordinator, BatchReport, FetchError, FileFetcher, LoadError, LocalShareFetcher,
    ShareLayout,
};
use crate::stats::{
    BASELINE_HISTORY, Frame, RenderStats, ShotStats, read_shot_stats, sort_history_versions,
};

/// Progress callback, called with `(completed, dispatched)`
pub type ProgressFn = Box<dyn FnMut(usize, usize) + Send>;

/// Result of one user action
#[derive(Debug, Default)]
pub struct ViewUpdate {
    /// What the display has to rebuild
    pub change: NavChange,
    pub notices: Vec<Notice>,
    /// Local copy of a frame log fetched by a frame click
    pub frame_log: Option<PathBuf>,
}

impl ViewUpdate {
    fn changed(change: NavChange, notices: Vec<Notice>) -> Self {
        Self {
            change,
            notices,
            frame_log: None,
        }
    }

    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            ..Default::default()
        }
    }
}

/// Shots that made it into the store, plus what went wrong on the way
struct SequenceLoad {
    loaded: Vec<String>,
    notices: Vec<Notice>,
}

pub struct ViewController {
    stats: RenderStats,
    fetcher: Arc<dyn FileFetcher>,
    layout: ShareLayout,
    naming: NamingRules,
    batch: BatchCoordinator,
    nav: NavState,
    history_options: Vec<String>,
    /// Numeric history folders listed on the share, per (sequence, shot)
    history_listings: HashMap<(String, String), Vec<String>>,
    /// (sequence, shot, history) files already downloaded and parsed
    fetched_histories: HashSet<(String, String, String)>,
    /// User files currently occupy the custom sequence in the store
    custom_loaded: bool,
    progress: Option<ProgressFn>,
}

impl ViewController {
    pub fn new(stats: RenderStats, fetcher: Arc<dyn FileFetcher>, layout: ShareLayout) -> Self {
        let stat = stats
            .catalog()
            .first()
            .map(|def| def.name.clone())
            .unwrap_or_default();
        Self {
            stats,
            fetcher,
            layout,
            naming: NamingRules::default(),
            batch: BatchCoordinator::default(),
            nav: NavState::new(stat),
            history_options: vec![BASELINE_HISTORY.to_string()],
            history_listings: HashMap::new(),
            fetched_histories: HashSet::new(),
            custom_loaded: false,
            progress: None,
        }
    }

    /// Build a controller reading from the configured share mount
    pub fn from_config(config: &Config) -> Result<Self> {
        let naming = config
            .naming()
            .context("Invalid sequence or shot pattern in config")?;
        let stats = RenderStats::new(config.catalog());
        let fetcher = Arc::new(LocalShareFetcher::new(&config.share.mount));
        let mut controller = Self::new(stats, fetcher, config.layout())
            .with_naming(naming)
            .with_batch(BatchCoordinator::new(config.viewer.workers));

        if let Some(stat) = &config.viewer.default_stat {
            if controller.stats.catalog().contains(stat) {
                controller.nav = controller.nav.with_stat(stat.clone());
            } else {
                tracing::warn!("Default stat '{}' is not in the stat catalog", stat);
            }
        }
        Ok(controller)
    }

    pub fn with_naming(mut self, naming: NamingRules) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_batch(mut self, batch: BatchCoordinator) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(usize, usize) + Send + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn nav(&self) -> &NavState {
        &self.nav
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn history_options(&self) -> &[String] {
        &self.history_options
    }

    /// Sequences on the share that match the naming rules
    pub async fn list_sequences(&self) -> Result<Vec<String>, FetchError> {
        let names = self.fetcher.list(&self.layout.sequences_dir()).await?;
        Ok(names
            .into_iter()
            .filter(|name| self.naming.is_sequence(name))
            .collect())
    }

    /// Shots of a sequence that have a render data folder on the share
    pub async fn list_shots(&self, sequence: &str) -> Result<Vec<String>, FetchError> {
        let names = self.fetcher.list(&self.layout.shots_dir(sequence)).await?;
        Ok(names
            .into_iter()
            .filter(|name| self.naming.is_shot(name))
            .collect())
    }

    /// Switch to a sequence, downloading its render data unless already loaded.
    ///
    /// If nothing could be loaded the view stays where it was.
    pub async fn select_sequence(&mut self, sequence: &str) -> ViewUpdate {
        let next = self.nav.select_sequence(sequence);
        let holds_custom = self.custom_loaded && sequence == CUSTOM_SEQUENCE;
        if !holds_custom && self.stats.has_data(sequence, None) {
            tracing::debug!("{} already loaded, skipping download", sequence);
            return ViewUpdate::changed(self.transition(next), Vec::new());
        }

        let SequenceLoad { loaded, notices } = self.load_sequence(sequence).await;
        if loaded.is_empty() {
            tracing::warn!(
                "No render data loaded for {}, staying on {}",
                sequence,
                self.nav.sequence().unwrap_or("no sequence")
            );
            return ViewUpdate::changed(NavChange::default(), notices);
        }
        ViewUpdate::changed(self.transition(next), notices)
    }

    pub fn enter_shot(&mut self, shot: &str) -> ViewUpdate {
        let next = match self.nav.enter_shot(shot) {
            Ok(next) => next,
            Err(e) => return rejected(e),
        };
        let sequence = next.sequence().unwrap_or_default().to_string();
        if !self.stats.has_data(&sequence, Some(shot)) {
            return ViewUpdate::notice(no_render_data(&format!("{} {}", sequence, shot)));
        }
        ViewUpdate::changed(self.transition(next), Vec::new())
    }

    pub fn back_to_sequence(&mut self) -> ViewUpdate {
        match self.nav.back_to_sequence() {
            Ok(next) => ViewUpdate::changed(self.transition(next), Vec::new()),
            Err(e) => rejected(e),
        }
    }

    /// Pick a render layer from the menu. History falls back to the baseline
    /// and the history menu is rebuilt for the new layer.
    pub async fn set_layer(&mut self, layer: LayerFilter) -> ViewUpdate {
        if let LayerFilter::Layer(name) = &layer {
            if !self.layer_options().iter().any(|option| option == name) {
                return rejected(NavError::UnknownRenderLayer(name.clone()));
            }
        }
        let next = self.nav.with_layer(layer);
        let change = self.transition(next);
        if self.nav.history_selectable() {
            self.refresh_history_options().await;
        }
        ViewUpdate::changed(change, Vec::new())
    }

    /// Pick a history version, downloading it first if it is not loaded.
    ///
    /// A failed download pins history to the baseline and reports an error.
    pub async fn set_history(&mut self, history: &str) -> ViewUpdate {
        let next = match self.nav.with_history(history) {
            Ok(next) => next,
            Err(e) => return rejected(e),
        };
        let (Some(sequence), Some(shot), Some(layer)) = (
            next.sequence().map(str::to_string),
            next.shot().map(str::to_string),
            next.layer().as_layer().map(str::to_string),
        ) else {
            return rejected(NavError::HistoryNotSelectable);
        };

        let loaded = self.fetched_histories.contains(&(
            sequence.clone(),
            shot.clone(),
            history.to_string(),
        )) || self
            .stats
            .read()
            .list_history_versions(&sequence, &shot, &layer)
            .iter()
            .any(|version| version == history);

        if !loaded {
            tracing::info!(
                "Getting stat data for {} {} at history {}",
                sequence,
                shot,
                history
            );
            if let Err(e) = self.load_history(&sequence, &shot, history).await {
                tracing::error!(
                    "Failed to load history {} of {} {}: {}",
                    history,
                    sequence,
                    shot,
                    e
                );
                let pinned = self
                    .nav
                    .with_history(BASELINE_HISTORY)
                    .unwrap_or_else(|_| self.nav.clone());
                let change = self.transition(pinned);
                let notice = Notice::error(
                    "Download Error",
                    format!(
                        "Could not load history {} for {} {}. Error is {}",
                        history, sequence, shot, e
                    ),
                );
                return ViewUpdate::changed(change, vec![notice]);
            }
            self.fetched_histories
                .insert((sequence, shot, history.to_string()));
            self.refresh_history_options().await;
        }
        ViewUpdate::changed(self.transition(next), Vec::new())
    }

    pub fn set_stat(&mut self, stat: &str) -> ViewUpdate {
        if !self.stats.catalog().contains(stat) {
            return rejected(NavError::UnknownStat(stat.to_string()));
        }
        let next = self.nav.with_stat(stat);
        ViewUpdate::changed(self.transition(next), Vec::new())
    }

    /// Handle a click on an x-axis label of the chart
    pub async fn click_axis(&mut self, value: &str) -> ViewUpdate {
        if self.nav.is_custom() {
            tracing::debug!("Ignoring click on {} in custom view", value);
            return ViewUpdate::default();
        }
        match self.naming.classify(value) {
            AxisValue::Sequence(sequence) => self.select_sequence(&sequence).await,
            AxisValue::Shot(shot) if self.nav.level() == Level::Sequence => self.enter_shot(&shot),
            AxisValue::Frame(frame) if self.nav.level() == Level::Shot => {
                self.open_frame_log(frame).await
            }
            _ => rejected(NavError::InvalidAxisValue(value.trim().to_string())),
        }
    }

    /// Download the render log of one frame of the selected layer
    pub async fn open_frame_log(&mut self, frame: Frame) -> ViewUpdate {
        if self.nav.is_custom() {
            return rejected(NavError::CustomData);
        }
        let (Some(sequence), Some(shot)) = (self.nav.sequence(), self.nav.shot()) else {
            return rejected(NavError::NoShot);
        };
        let LayerFilter::Layer(layer) = self.nav.layer() else {
            return ViewUpdate::notice(Notice::info(
                "Unsupported Log Selection",
                "Select a render layer in the render layer menu, then click on a frame to load the log.",
            ));
        };

        let remote = self
            .layout
            .frame_log_file(sequence, shot, layer, self.nav.history(), frame);
        let local_dir = self.layout.local_dir_for(&remote);
        match self.fetcher.fetch(&remote, &local_dir).await {
            Ok(path) => {
                tracing::info!("Frame log ready at {}", path.display());
                ViewUpdate {
                    frame_log: Some(path),
                    ..Default::default()
                }
            }
            Err(e) => {
                tracing::error!("Failed to download log {}: {}", remote, e);
                ViewUpdate::notice(Notice::error(
                    "Log Download Error",
                    format!("Encountered an error downloading the log. Error is {}", e),
                ))
            }
        }
    }

    /// Load user stat files into the custom view
    pub async fn load_custom_data(&mut self, paths: Vec<PathBuf>) -> ViewUpdate {
        if paths.is_empty() {
            return ViewUpdate::notice(Notice::error(
                "Error Formatting Custom Data",
                "No stat files given",
            ));
        }
        let items = paths
            .into_iter()
            .map(|path| (path.display().to_string(), path))
            .collect();
        let parsed = self.parse_batch(items).await;

        let mut notices = Vec::new();
        let errors: Vec<String> = parsed
            .failures()
            .map(|(label, e)| format!("{}: {}", label, e))
            .collect();
        if !errors.is_empty() {
            tracing::warn!("Custom data errors: {}", errors.join(", "));
            notices.push(Notice::error(
                "Error Formatting Custom Data",
                errors.join("\n"),
            ));
        }
        if parsed.is_total_failure() {
            return ViewUpdate::changed(NavChange::default(), notices);
        }

        let mut merged = ShotStats::default();
        for (_, stats) in parsed.into_successes() {
            merged.merge(stats);
        }
        self.clear_sequence(CUSTOM_SEQUENCE);
        self.custom_loaded = true;
        self.stats
            .replace_shot(CUSTOM_SEQUENCE, CUSTOM_SHOT, BASELINE_HISTORY, merged);
        let next = self.nav.custom_view();
        ViewUpdate::changed(self.transition(next), notices)
    }

    /// Render layers offered in the layer menu, "All Render Layers" first
    pub fn layer_options(&self) -> Vec<String> {
        let mut options = vec![ALL_RENDER_LAYERS.to_string()];
        if let Some(sequence) = self.nav.sequence() {
            let shot = match self.nav.level() {
                Level::Shot => self.nav.shot(),
                Level::Sequence => None,
            };
            options.extend(
                self.stats
                    .read()
                    .list_render_layers(sequence, shot, BASELINE_HISTORY),
            );
        }
        options
    }

    /// Current view, `None` when the scope has no render data
    pub fn render(&self) -> Option<ViewFrame> {
        let catalog = self.stats.catalog();
        let (chart, sidebar) = self.stats.with_aggregator(|agg| {
            (
                build_chart(&agg, catalog, &self.nav),
                build_sidebar(&agg, catalog, &self.nav),
            )
        });
        let chart = chart?;

        Some(ViewFrame {
            breadcrumb: self.nav.breadcrumb(),
            stat_options: catalog.names().map(str::to_string).collect(),
            selected_stat: self.nav.stat().to_string(),
            layer_options: self.layer_options(),
            selected_layer: self.nav.layer().to_string(),
            history_options: self.history_options.clone(),
            history_enabled: self.nav.history_selectable(),
            selected_history: self.nav.history().to_string(),
            chart,
            sidebar,
        })
    }

    /// Hand an update's notices and the current view to a display
    pub fn present(&self, update: &ViewUpdate, sink: &mut dyn DisplaySink) {
        for notice in &update.notices {
            sink.notify(notice);
        }
        match self.render() {
            Some(frame) => sink.show(&frame),
            None => {
                if let Some(sequence) = self.nav.sequence() {
                    let notice = no_render_data(sequence);
                    if !update.notices.contains(&notice) {
                        sink.notify(&notice);
                    }
                }
            }
        }
    }

    fn transition(&mut self, next: NavState) -> NavChange {
        let change = self.nav.diff(&next);
        self.nav = next;
        if change.history_menu() && !self.nav.history_selectable() {
            self.history_options = vec![BASELINE_HISTORY.to_string()];
        }
        change
    }

    async fn refresh_history_options(&mut self) {
        let (Some(sequence), Some(shot), Some(layer)) = (
            self.nav.sequence().map(str::to_string),
            self.nav.shot().map(str::to_string),
            self.nav.layer().as_layer().map(str::to_string),
        ) else {
            return;
        };

        let key = (sequence.clone(), shot.clone());
        let mut options = match self.history_listings.get(&key) {
            Some(listed) => listed.clone(),
            None => {
                let dir = self.layout.shot_history_dir(&sequence, &shot);
                match self.fetcher.list(&dir).await {
                    Ok(names) => {
                        let listed: Vec<String> = names
                            .into_iter()
                            .filter(|name| name.parse::<u64>().is_ok())
                            .collect();
                        self.history_listings.insert(key, listed.clone());
                        listed
                    }
                    Err(e) => {
                        tracing::warn!("Could not list history of {} {}: {}", sequence, shot, e);
                        Vec::new()
                    }
                }
            }
        };

        options.extend(
            self.stats
                .read()
                .list_history_versions(&sequence, &shot, &layer),
        );
        options.push(BASELINE_HISTORY.to_string());
        sort_history_versions(&mut options);
        self.history_options = options;
    }

    async fn load_sequence(&mut self, sequence: &str) -> SequenceLoad {
        let mut notices = Vec::new();
        let shots = match self.list_shots(sequence).await {
            Ok(shots) if !shots.is_empty() => shots,
            Ok(_) => {
                notices.push(no_render_data(sequence));
                return SequenceLoad {
                    loaded: Vec::new(),
                    notices,
                };
            }
            Err(e) => {
                tracing::error!("Failed to list shots of {}: {}", sequence, e);
                notices.push(no_render_data(sequence));
                return SequenceLoad {
                    loaded: Vec::new(),
                    notices,
                };
            }
        };

        tracing::info!(
            "Downloading render data for {} shots of {}",
            shots.len(),
            sequence
        );
        let items = shots
            .into_iter()
            .map(|shot| {
                let remote = self
                    .layout
                    .shot_stats_file(sequence, &shot, BASELINE_HISTORY);
                (shot, remote)
            })
            .collect();
        let fetched = self.fetch_batch(items).await;

        if fetched.is_total_failure() {
            log_failures("download", &fetched);
            notices.push(Notice::error(
                "Download Error",
                "Could not download render stats. See log for details.",
            ));
            return SequenceLoad {
                loaded: Vec::new(),
                notices,
            };
        }
        if fetched.is_partial_failure() {
            log_failures("download", &fetched);
            notices.push(Notice::warning(
                "Download Error",
                format!(
                    "({}) shot's render data could not be downloaded: {}. See log for details.",
                    fetched.failures().count(),
                    fetched.failed_labels().join(", ")
                ),
            ));
        }
        let download_ms = fetched.elapsed_ms();

        let parsed = self.parse_batch(fetched.into_successes()).await;
        if parsed.failures().next().is_some() {
            log_failures("parse", &parsed);
            notices.push(Notice::error(
                "Stats File Error",
                format!(
                    "({}) shot's render data could not be read: {}. See log for details.",
                    parsed.failures().count(),
                    parsed.failed_labels().join(", ")
                ),
            ));
        }

        let mut loaded = Vec::new();
        if parsed.success_count() > 0 && sequence == CUSTOM_SEQUENCE && self.custom_loaded {
            tracing::info!("Replacing custom data with {} from the share", sequence);
            self.clear_sequence(sequence);
            self.custom_loaded = false;
        }
        for (shot, stats) in parsed.into_successes() {
            self.stats
                .replace_shot(sequence, &shot, BASELINE_HISTORY, stats);
            loaded.push(shot);
        }
        tracing::info!(
            "Loaded {} shots of {} (download took {}ms)",
            loaded.len(),
            sequence,
            download_ms
        );
        SequenceLoad { loaded, notices }
    }

    fn clear_sequence(&mut self, sequence: &str) {
        self.stats.remove_sequence(sequence);
        self.fetched_histories.retain(|(seq, _, _)| seq != sequence);
    }

    async fn load_history(&self, sequence: &str, shot: &str, history: &str) -> Result<(), LoadError> {
        let remote = self.layout.shot_stats_file(sequence, shot, history);
        let local = self
            .fetcher
            .fetch(&remote, &self.layout.local_dir_for(&remote))
            .await?;
        let stats = self.stats.clone();
        let parsed =
            tokio::task::spawn_blocking(move || read_shot_stats(&local, stats.catalog())).await??;
        self.stats.replace_shot(sequence, shot, history, parsed);
        Ok(())
    }

    /// Fetch remote files, labelled by shot
    async fn fetch_batch(
        &mut self,
        items: Vec<(String, String)>,
    ) -> BatchReport<PathBuf, LoadError> {
        let fetcher = Arc::clone(&self.fetcher);
        let layout = self.layout.clone();
        let batch = self.batch;
        let progress = &mut self.progress;
        batch
            .run(
                items,
                |remote: String| {
                    let fetcher = Arc::clone(&fetcher);
                    let local_dir = layout.local_dir_for(&remote);
                    async move {
                        let local = fetcher.fetch(&remote, &local_dir).await?;
                        Ok::<_, LoadError>(local)
                    }
                },
                |done, total| report_progress(progress, done, total),
            )
            .await
    }

    /// Parse local stat files on the blocking pool
    async fn parse_batch(
        &mut self,
        items: Vec<(String, PathBuf)>,
    ) -> BatchReport<ShotStats, LoadError> {
        let stats = self.stats.clone();
        let batch = self.batch;
        let progress = &mut self.progress;
        batch
            .run(
                items,
                |path: PathBuf| {
                    let stats = stats.clone();
                    async move {
                        let parsed = tokio::task::spawn_blocking(move || {
                            read_shot_stats(&path, stats.catalog())
                        })
                        .await??;
                        Ok::<_, LoadError>(parsed)
                    }
                },
                |done, total| report_progress(progress, done, total),
            )
            .await
    }
}

fn report_progress(progress: &mut Option<ProgressFn>, done: usize, total: usize) {
    if let Some(callback) = progress.as_mut() {
        callback(done, total);
    }
}

fn log_failures<T>(stage: &str, report: &BatchReport<T, LoadError>) {
    let errors: Vec<String> = report
        .failures()
        .map(|(label, e)| format!("{}: {}", label, e))
        .collect();
    tracing::error!(
        "Failed to {} {} of {} shots: {}",
        stage,
        errors.len(),
        report.dispatched(),
        errors.join(", ")
    );
}

fn rejected(error: NavError) -> ViewUpdate {
    tracing::warn!("{}", error);
    ViewUpdate::notice(Notice::warning("Warning", error.to_string()))
}

fn no_render_data(scope: &str) -> Notice {
    Notice::error(
        "No render data",
        format!("Could not find any render data for {}", scope),
    )
}
