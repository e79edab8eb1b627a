//! Bar chart and averages sidebar data
//!
//! Builds what the display sink draws from the navigation state and the
//! aggregator: one bar per shot in the sequence view, one bar per frame in
//! the shot view, and the scope's average next to the chart.

use serde::Serialize;

use crate::stats::{Aggregator, StatCatalog, StatDefinition, StatTotals, StatUnit};

use super::nav::{LayerFilter, Level, NavState};

/// RGB colour hint for the display sink
pub type Rgb = (u8, u8, u8);

/// Bar colour for stat totals
pub const TOTAL_COLOR: Rgb = (100, 100, 100);

/// Single-bar colour for ratio stats
pub const RATIO_COLOR: Rgb = (227, 192, 0);

/// Cool palette for time components
pub const COOL_PALETTE: [Rgb; 5] = [
    (44, 187, 162),
    (0, 160, 187),
    (51, 102, 204),
    (102, 102, 204),
    (127, 76, 159),
];

/// Warm palette for size components
pub const WARM_PALETTE: [Rgb; 6] = [
    (227, 192, 0),
    (227, 155, 0),
    (227, 134, 0),
    (204, 102, 0),
    (204, 51, 0),
    (204, 0, 0),
];

fn palette(unit: StatUnit) -> &'static [Rgb] {
    match unit {
        StatUnit::Size => &WARM_PALETTE,
        StatUnit::Time | StatUnit::Ratio => &COOL_PALETTE,
    }
}

/// Colour of the `index`th component, cycling through the unit's palette
pub fn component_color(unit: StatUnit, index: usize) -> Rgb {
    let colors = palette(unit);
    colors[index % colors.len()]
}

/// Colours for the total bar and each component segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarColors {
    pub total: Rgb,
    pub components: Vec<Rgb>,
}

impl BarColors {
    pub fn for_stat(def: &StatDefinition) -> Self {
        let total = match def.unit {
            StatUnit::Ratio => RATIO_COLOR,
            StatUnit::Time | StatUnit::Size => TOTAL_COLOR,
        };
        let components = (0..def.components.len())
            .map(|i| component_color(def.unit, i))
            .collect();
        Self { total, components }
    }
}

/// Data for the bar chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub x_axis_label: &'static str,
    pub y_axis_label: &'static str,
    pub labels: Vec<String>,
    pub totals: Vec<f64>,
    pub components: Vec<Vec<f64>>,
    pub colors: BarColors,
}

impl Chart {
    fn new(level: Level, def: &StatDefinition) -> Self {
        Self {
            x_axis_label: level.axis_label(),
            y_axis_label: def.unit.axis_label(),
            labels: Vec::new(),
            totals: Vec::new(),
            components: Vec::new(),
            colors: BarColors::for_stat(def),
        }
    }

    fn push(&mut self, label: impl Into<String>, value: StatTotals) {
        self.labels.push(label.into());
        self.totals.push(value.total);
        self.components.push(value.components);
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

/// One component line of the sidebar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarEntry {
    pub name: String,
    pub value: f64,
    pub color: Rgb,
}

/// Averages shown next to the chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageSidebar {
    pub stat: String,
    pub unit: StatUnit,
    /// "Shot" or "Frame"
    pub per: &'static str,
    pub total: f64,
    pub components: Vec<SidebarEntry>,
}

impl AverageSidebar {
    /// e.g. `25.50 min / Frame`
    pub fn headline(&self) -> String {
        format_average(self.total, self.unit, self.per)
    }
}

pub fn format_average(value: f64, unit: StatUnit, per: &str) -> String {
    format!("{:.2} {} / {}", value, unit.suffix(), per)
}

/// Bars for the current view, `None` if nothing is loaded for it
pub fn build_chart(agg: &Aggregator<'_>, catalog: &StatCatalog, nav: &NavState) -> Option<Chart> {
    let def = catalog.get(nav.stat())?;
    let sequence = nav.sequence()?;
    let mut chart = Chart::new(nav.level(), def);

    match (nav.level(), nav.shot()) {
        (Level::Shot, Some(shot)) => {
            let series = match nav.layer() {
                LayerFilter::All => agg.combined_frames(&def.name, sequence, shot, nav.history()),
                LayerFilter::Layer(layer) => {
                    agg.layer_frames(&def.name, sequence, shot, layer, nav.history())
                }
            };
            for (frame, value) in series {
                chart.push(frame.to_string(), value);
            }
        }
        _ => {
            let layer = nav.layer().as_layer();
            for shot in agg.store().list_shots(sequence, layer) {
                if let Some(value) =
                    agg.average(&def.name, sequence, Some(shot.as_str()), layer, Some(nav.history()))
                {
                    chart.push(shot, value);
                }
            }
        }
    }

    (!chart.is_empty()).then_some(chart)
}

/// Sidebar averages for the current view
pub fn build_sidebar(
    agg: &Aggregator<'_>,
    catalog: &StatCatalog,
    nav: &NavState,
) -> Option<AverageSidebar> {
    let def = catalog.get(nav.stat())?;
    let sequence = nav.sequence()?;
    let shot = match nav.level() {
        Level::Shot => nav.shot(),
        Level::Sequence => None,
    };
    let average = agg.average(
        &def.name,
        sequence,
        shot,
        nav.layer().as_layer(),
        Some(nav.history()),
    )?;

    let components = def
        .components
        .iter()
        .zip(average.components)
        .enumerate()
        .map(|(i, (name, value))| SidebarEntry {
            name: name.clone(),
            value,
            color: component_color(def.unit, i),
        })
        .collect();

    Some(AverageSidebar {
        stat: def.name.clone(),
        unit: def.unit,
        per: nav.level().axis_label(),
        total: average.total,
        components,
    })
}
