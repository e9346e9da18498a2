use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::alert::{AlertState, Notification};
use crate::config::DashboardConfig;
use crate::curve::{project_decay_curve, CurvePoint};
use crate::grid::{generate_grid, BlockGrid};
use crate::model::{HealthModel, HealthResult, ModelError, SimulationInput, Status};
use crate::rng::Sampler;

pub const GAUGE_TITLE: &str = "Risk Level %";
pub const FAILURE_LINE: f64 = 50.0;
pub const FAILURE_LABEL: &str = "FAILURE THRESHOLD";
pub const CHART_Y_RANGE: [f64; 2] = [0.0, 110.0];
pub const HEATMAP_SCALE: &str = "RdYlGn";

#[derive(Debug, Clone, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBadge {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub health: MetricCard,
    pub status: StatusBadge,
    pub risk: MetricCard,
}

#[derive(Debug, Clone, Serialize)]
pub struct GaugeBand {
    pub from: f64,
    pub to: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Gauge {
    pub title: &'static str,
    pub value: f64,
    pub range: [f64; 2],
    pub bar_color: &'static str,
    pub bands: Vec<GaugeBand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdLine {
    pub y: f64,
    pub label: &'static str,
    pub color: &'static str,
    pub dashed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecayChart {
    pub points: Vec<CurvePoint>,
    pub line_color: &'static str,
    pub threshold: ThresholdLine,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub y_range: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct Heatmap {
    pub grid: BlockGrid,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub color_scale: &'static str,
    pub z_range: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardFrame {
    pub preset: String,
    pub title: String,
    pub rendered_at: DateTime<Utc>,
    pub input: SimulationInput,
    pub result: HealthResult,
    pub metrics: Metrics,
    pub gauge: Gauge,
    pub decay_chart: DecayChart,
    pub heatmap: Heatmap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

pub struct RenderOutcome {
    pub frame: DashboardFrame,
    pub alert_state: AlertState,
}

pub struct Dashboard {
    config: DashboardConfig,
    model: HealthModel,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let model = HealthModel::new(config.model.clone());
        Self { config, model }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn model(&self) -> &HealthModel {
        &self.model
    }

    pub fn default_input(&self) -> SimulationInput {
        let controls = &self.config.controls;
        SimulationInput::new(
            controls.default_temp_c,
            controls.default_years,
            controls.default_cost,
        )
    }

    /// One full recomputation. The alert state goes in and the updated state
    /// comes back out with the frame; nothing is retained here.
    pub fn render<S: Sampler + ?Sized>(
        &self,
        input: &SimulationInput,
        alert_state: AlertState,
        sampler: &mut S,
    ) -> Result<RenderOutcome, ModelError> {
        if input.block.is_some() && !self.config.controls.block_selector {
            return Err(ModelError::InvalidInput(format!(
                "preset '{}' has no block selector",
                self.config.name
            )));
        }
        let result = self.model.compute(input)?;
        let grid = generate_grid(
            input.years,
            result.degradation_factor,
            self.config.model.grid_rate,
            sampler,
        );
        let (alert_state, notification) =
            alert_state.observe(result.status, &self.config.alerts, sampler);
        if let Some(note) = &notification {
            debug!(status = note.status.label(), message = %note.message, "status transition");
        }

        let frame = DashboardFrame {
            preset: self.config.name.clone(),
            title: self.config.title.clone(),
            rendered_at: Utc::now(),
            input: input.clone(),
            result,
            metrics: self.metrics(&result),
            gauge: gauge(&result),
            decay_chart: self.decay_chart(&result),
            heatmap: Heatmap {
                grid,
                row_labels: BlockGrid::row_labels(),
                col_labels: BlockGrid::col_labels(),
                color_scale: HEATMAP_SCALE,
                z_range: [0.0, 100.0],
            },
            notification,
        };
        Ok(RenderOutcome { frame, alert_state })
    }

    fn metrics(&self, result: &HealthResult) -> Metrics {
        Metrics {
            health: MetricCard {
                label: self.config.labels.health_metric.clone(),
                value: format!("{:.1}%", result.health_percent),
                delta: Some(format!("-{:.1}%", 100.0 - result.health_percent)),
            },
            status: StatusBadge {
                label: result.status.label(),
                color: result.status.color(),
                icon: result.status.icon(),
            },
            risk: MetricCard {
                label: "Estimated Risk Value".to_string(),
                value: format_currency(&self.config.labels.currency_prefix, result.risk_value),
                delta: None,
            },
        }
    }

    fn decay_chart(&self, result: &HealthResult) -> DecayChart {
        let line_color = if result.status == Status::Critical {
            Status::Critical.color()
        } else {
            Status::Healthy.color()
        };
        DecayChart {
            points: project_decay_curve(result.degradation_factor),
            line_color,
            threshold: ThresholdLine {
                y: FAILURE_LINE,
                label: FAILURE_LABEL,
                color: "red",
                dashed: true,
            },
            x_title: "Months from Today",
            y_title: "Health %",
            y_range: CHART_Y_RANGE,
        }
    }
}

fn gauge(result: &HealthResult) -> Gauge {
    Gauge {
        title: GAUGE_TITLE,
        value: 100.0 - result.health_percent,
        range: [0.0, 100.0],
        bar_color: "black",
        bands: vec![
            GaugeBand {
                from: 0.0,
                to: 50.0,
                color: "green",
            },
            GaugeBand {
                from: 50.0,
                to: 80.0,
                color: "orange",
            },
            GaugeBand {
                from: 80.0,
                to: 100.0,
                color: "red",
            },
        ],
    }
}

/// Whole-unit amount with thousands separators, e.g. `Rs12,345`.
pub fn format_currency(prefix: &str, amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (index, digit) in rounded.chars().enumerate() {
        if index > 0 && (rounded.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{prefix}{sign}{grouped}")
}
