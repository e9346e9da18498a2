use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::BlockId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Healthy,
    Warning,
    Critical,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Healthy => "HEALTHY",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Status::Healthy => "green",
            Status::Warning => "orange",
            Status::Critical => "red",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Status::Healthy => "✅",
            Status::Warning => "⚠️",
            Status::Critical => "🚨",
        }
    }
}

fn default_baseline_temp_c() -> i32 {
    25
}

fn default_acceleration() -> f64 {
    1.2
}

fn default_critical_threshold() -> f64 {
    50.0
}

fn default_risk_multiplier() -> f64 {
    31.0
}

fn default_grid_rate() -> f64 {
    8.0
}

fn default_temp_min() -> i32 {
    20
}

fn default_temp_max() -> i32 {
    40
}

/// Constants of the degradation model. The two historical dashboards disagree
/// on `base_rate`, `warning_threshold` and `year_max`, so none of them has a
/// default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub base_rate: f64,
    #[serde(default = "default_grid_rate")]
    pub grid_rate: f64,
    pub warning_threshold: f64,
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
    #[serde(default = "default_baseline_temp_c")]
    pub baseline_temp_c: i32,
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    #[serde(default = "default_risk_multiplier")]
    pub risk_multiplier: f64,
    #[serde(default = "default_temp_min")]
    pub temp_min: i32,
    #[serde(default = "default_temp_max")]
    pub temp_max: i32,
    pub year_max: u32,
}

impl ModelParams {
    pub fn command_center() -> Self {
        Self {
            base_rate: 8.0,
            grid_rate: default_grid_rate(),
            warning_threshold: 75.0,
            critical_threshold: default_critical_threshold(),
            baseline_temp_c: default_baseline_temp_c(),
            acceleration: default_acceleration(),
            risk_multiplier: default_risk_multiplier(),
            temp_min: default_temp_min(),
            temp_max: default_temp_max(),
            year_max: 9,
        }
    }

    pub fn block_selector() -> Self {
        Self {
            base_rate: 6.0,
            warning_threshold: 60.0,
            year_max: 10,
            ..Self::command_center()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    pub temp_c: i32,
    pub years: u32,
    pub cost_per_block: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockId>,
}

impl SimulationInput {
    pub fn new(temp_c: i32, years: u32, cost_per_block: f64) -> Self {
        Self {
            temp_c,
            years,
            cost_per_block,
            block: None,
        }
    }

    pub fn with_block(mut self, block: BlockId) -> Self {
        self.block = Some(block);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthResult {
    pub degradation_factor: f64,
    pub health_percent: f64,
    pub risk_value: f64,
    pub status: Status,
}

pub struct HealthModel {
    params: ModelParams,
}

impl HealthModel {
    pub fn new(params: ModelParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Multiplier applied to the decay rate; exactly 1 at the baseline temperature.
    pub fn degradation_factor(&self, temp_c: i32) -> f64 {
        self.params
            .acceleration
            .powi(temp_c - self.params.baseline_temp_c)
    }

    pub fn classify(&self, health_percent: f64) -> Status {
        if health_percent < self.params.critical_threshold {
            Status::Critical
        } else if health_percent < self.params.warning_threshold {
            Status::Warning
        } else {
            Status::Healthy
        }
    }

    pub fn validate(&self, input: &SimulationInput) -> Result<(), ModelError> {
        let params = &self.params;
        if input.temp_c < params.temp_min || input.temp_c > params.temp_max {
            return Err(ModelError::InvalidInput(format!(
                "temperature {} °C outside [{}, {}]",
                input.temp_c, params.temp_min, params.temp_max
            )));
        }
        if input.years < 1 || input.years > params.year_max {
            return Err(ModelError::InvalidInput(format!(
                "projection of {} years outside [1, {}]",
                input.years, params.year_max
            )));
        }
        if !input.cost_per_block.is_finite() || input.cost_per_block < 0.0 {
            return Err(ModelError::InvalidInput(format!(
                "cost per block must be a non-negative amount, got {}",
                input.cost_per_block
            )));
        }
        Ok(())
    }

    pub fn compute(&self, input: &SimulationInput) -> Result<HealthResult, ModelError> {
        self.validate(input)?;
        let degradation_factor = self.degradation_factor(input.temp_c);
        let loss = input.years as f64 * self.params.base_rate * degradation_factor;
        let health_percent = (100.0 - loss).clamp(0.0, 100.0);
        let risk_value = (100.0 - health_percent)
            * self.params.risk_multiplier
            * (input.cost_per_block / 100.0);
        if !risk_value.is_finite() {
            return Err(ModelError::InvalidInput(format!(
                "cost per block {} overflows the risk estimate",
                input.cost_per_block
            )));
        }
        Ok(HealthResult {
            degradation_factor,
            health_percent,
            risk_value,
            status: self.classify(health_percent),
        })
    }
}
