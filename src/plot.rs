//! Forecast comparison plots.
//!
//! Assembles the traces for one challenge: the observed context of each
//! series, one forecast line per selected model and the actual values over
//! the forecast horizon. Rendering is left to the client; this module only
//! decides what is drawn and how it is labelled.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{ChallengeSeries, ForecastsResponse, SeriesData};

/// Colours handed out to models in first-seen order.
pub const PALETTE: &[&str] = &[
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52", "#66C2A5", "#FC8D62", "#8DA0CB", "#E78AC3", "#A6D854", "#FFD92F",
    "#E5C494", "#B3B3B3",
];

/// Shown instead of traces when no series is left to draw.
pub const NO_SERIES_MESSAGE: &str = "No series selected or found";

const HISTORICAL_COLOR: &str = "black";
const ACTUAL_COLOR: &str = "grey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Historical,
    Forecast,
    Actual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub ts: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub color: String,
    pub legend_group: String,
    pub points: Vec<PlotPoint>,
}

/// Everything needed to plot one series.
#[derive(Debug, Clone)]
pub struct SeriesPlotData {
    pub series: ChallengeSeries,
    /// Observed values over the context window
    pub context: SeriesData,
    /// Observed values after the context window
    pub actual: SeriesData,
    pub forecasts: ForecastsResponse,
}

#[derive(Debug, Clone)]
pub struct PlotInput {
    pub challenge_title: String,
    pub series: Vec<SeriesPlotData>,
    /// Readable ids of the models to draw; `None` draws every model.
    pub selected_models: Option<Vec<String>>,
    pub horizon_steps: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastPlot {
    pub title: String,
    pub horizon_steps: Option<u64>,
    pub traces: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ForecastPlot {
    pub fn assemble(input: PlotInput) -> Self {
        let multiple = input.series.len() > 1;
        let mut colors = ColorMap::default();
        let mut traces = Vec::new();

        for (idx, entry) in input.series.iter().enumerate() {
            let series_name = entry.series.label();
            let group = format!("series_{}", entry.series.series_id);

            let history: Vec<PlotPoint> = entry
                .context
                .data
                .iter()
                .map(|p| PlotPoint {
                    ts: p.ts,
                    value: p.value,
                })
                .collect();

            if !history.is_empty() {
                traces.push(Trace {
                    name: if multiple {
                        format!("Historical - {}", series_name)
                    } else {
                        "Historical Data".to_string()
                    },
                    kind: TraceKind::Historical,
                    color: HISTORICAL_COLOR.to_string(),
                    legend_group: group.clone(),
                    points: history.clone(),
                });
            }

            for (model_id, forecast) in &entry.forecasts.forecasts {
                if forecast.data.is_empty() || !is_selected(&input.selected_models, model_id) {
                    continue;
                }

                let label = if forecast.label.is_empty() {
                    model_id.as_str()
                } else {
                    forecast.label.as_str()
                };
                let mut name = format!("{} - Prelim MASE: {}", label, format_mase(forecast.current_mase));
                if multiple {
                    name.push_str(&format!(" ({})", series_name));
                }

                // Start each forecast at the last observed value so the lines connect.
                let points = history
                    .last()
                    .cloned()
                    .into_iter()
                    .chain(forecast.data.iter().map(|p| PlotPoint { ts: p.ts, value: p.y }))
                    .collect();

                traces.push(Trace {
                    name,
                    kind: TraceKind::Forecast,
                    color: colors.get(label),
                    legend_group: label.to_string(),
                    points,
                });
            }

            // Actual values are only drawn for the first series.
            if idx == 0 {
                let limit = input
                    .horizon_steps
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(usize::MAX);
                let points: Vec<PlotPoint> = entry
                    .actual
                    .data
                    .iter()
                    .take(limit)
                    .map(|p| PlotPoint {
                        ts: p.ts,
                        value: p.value,
                    })
                    .collect();
                if !points.is_empty() {
                    traces.push(Trace {
                        name: format!("Actual - {}", series_name),
                        kind: TraceKind::Actual,
                        color: ACTUAL_COLOR.to_string(),
                        legend_group: group,
                        points,
                    });
                }
            }
        }

        let steps = input
            .horizon_steps
            .map(|n| n.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            title: format!(
                "{} - Forecast Comparison ({} steps ahead)",
                input.challenge_title, steps
            ),
            horizon_steps: input.horizon_steps,
            traces,
            message: input
                .series
                .is_empty()
                .then(|| NO_SERIES_MESSAGE.to_string()),
        }
    }

    pub fn forecast_traces(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter().filter(|t| t.kind == TraceKind::Forecast)
    }
}

fn is_selected(selected: &Option<Vec<String>>, model_id: &str) -> bool {
    selected
        .as_ref()
        .map_or(true, |ids| ids.iter().any(|id| id == model_id))
}

fn format_mase(mase: Option<f64>) -> String {
    mase.map(|m| format!("{:.2}", m))
        .unwrap_or_else(|| "N/A".to_string())
}

#[derive(Default)]
struct ColorMap {
    assigned: HashMap<String, String>,
}

impl ColorMap {
    fn get(&mut self, label: &str) -> String {
        let next = self.assigned.len();
        self.assigned
            .entry(label.to_string())
            .or_insert_with(|| PALETTE[next % PALETTE.len()].to_string())
            .clone()
    }
}
