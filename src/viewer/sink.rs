//! Display sink contract and a plain-text implementation

use std::io::Write;

use serde::Serialize;

use super::chart::{AverageSidebar, Chart};
use super::nav::Crumb;

/// Everything a display needs to draw the current view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    pub breadcrumb: Vec<Crumb>,
    pub stat_options: Vec<String>,
    pub selected_stat: String,
    /// `All Render Layers` first, then the layers in scope
    pub layer_options: Vec<String>,
    pub selected_layer: String,
    pub history_options: Vec<String>,
    pub history_enabled: bool,
    pub selected_history: String,
    pub chart: Chart,
    pub sidebar: Option<AverageSidebar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with(Severity::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with(Severity::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with(Severity::Error, title, message)
    }

    fn with(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{}] {}: {}", tag, self.title, self.message)
    }
}

/// Where the viewer draws
pub trait DisplaySink {
    fn show(&mut self, frame: &ViewFrame);
    fn notify(&mut self, notice: &Notice);
}

/// Renders frames as text into any writer
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &ViewFrame) -> std::io::Result<()> {
        let crumbs: Vec<&str> = frame.breadcrumb.iter().map(|c| c.label.as_str()).collect();
        writeln!(self.out, "{}", crumbs.join(" > "))?;
        writeln!(
            self.out,
            "stat: {}  layer: {}  history: {}{}",
            frame.selected_stat,
            frame.selected_layer,
            frame.selected_history,
            if frame.history_enabled { "" } else { " (fixed)" }
        )?;
        writeln!(self.out, "layers: {}", frame.layer_options.join(", "))?;
        if frame.history_enabled {
            writeln!(self.out, "history: {}", frame.history_options.join(", "))?;
        }
        writeln!(self.out)?;

        let chart = &frame.chart;
        let width = chart.labels.iter().map(|l| l.len()).max().unwrap_or(0);
        let peak = chart.totals.iter().cloned().fold(0.0_f64, f64::max);
        writeln!(self.out, "{:>width$}  {}", chart.x_axis_label, chart.y_axis_label)?;
        for (label, total) in chart.labels.iter().zip(&chart.totals) {
            let bar = if peak > 0.0 {
                ((total / peak) * 40.0).round() as usize
            } else {
                0
            };
            writeln!(self.out, "{:>width$}  {} {:.2}", label, "#".repeat(bar), total)?;
        }

        if let Some(sidebar) = &frame.sidebar {
            writeln!(self.out)?;
            writeln!(self.out, "Average {}: {}", sidebar.stat, sidebar.headline())?;
            for entry in &sidebar.components {
                writeln!(self.out, "  {}: {:.2}", entry.name, entry.value)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> DisplaySink for TextSink<W> {
    fn show(&mut self, frame: &ViewFrame) {
        if let Err(e) = self.write_frame(frame) {
            tracing::warn!("Failed to write view: {}", e);
        }
    }

    fn notify(&mut self, notice: &Notice) {
        if let Err(e) = writeln!(self.out, "{}", notice) {
            tracing::warn!("Failed to write notice: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatUnit;
    use crate::viewer::chart::{BarColors, SidebarEntry, TOTAL_COLOR};

    fn frame() -> ViewFrame {
        ViewFrame {
            breadcrumb: vec![
                Crumb {
                    label: "SeqA".into(),
                    links_to_sequence: true,
                },
                Crumb {
                    label: "Sh01".into(),
                    links_to_sequence: false,
                },
            ],
            stat_options: vec!["render time".into()],
            selected_stat: "render time".into(),
            layer_options: vec!["All Render Layers".into(), "Qian".into()],
            selected_layer: "All Render Layers".into(),
            history_options: vec!["1".into()],
            history_enabled: false,
            selected_history: "1".into(),
            chart: Chart {
                x_axis_label: "Frame",
                y_axis_label: "minutes (min)",
                labels: vec!["1001".into(), "1002".into()],
                totals: vec![10.0, 20.0],
                components: vec![vec![], vec![]],
                colors: BarColors {
                    total: TOTAL_COLOR,
                    components: vec![],
                },
            },
            sidebar: Some(AverageSidebar {
                stat: "render time".into(),
                unit: StatUnit::Time,
                per: "Frame",
                total: 15.0,
                components: vec![SidebarEntry {
                    name: "texture".into(),
                    value: 1.5,
                    color: TOTAL_COLOR,
                }],
            }),
        }
    }

    #[test]
    fn test_text_sink_renders_frame() {
        let mut sink = TextSink::new(Vec::new());
        sink.show(&frame());
        let text = String::from_utf8(sink.into_inner()).unwrap();

        assert!(text.starts_with("SeqA > Sh01\n"));
        assert!(text.contains("history: 1 (fixed)"));
        assert!(text.contains("1002  ######################################## 20.00"));
        assert!(text.contains("Average render time: 15.00 min / Frame"));
        assert!(text.contains("  texture: 1.50"));
    }

    #[test]
    fn test_text_sink_notice() {
        let mut sink = TextSink::new(Vec::new());
        sink.notify(&Notice::warning("Warning", "(1) shot's render data could not be downloaded"));
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "[warning] Warning: (1) shot's render data could not be downloaded\n"
        );
    }
}
