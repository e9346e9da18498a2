use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::alert::AlertPolicy;
use crate::model::ModelParams;

fn default_temp_c() -> i32 {
    25
}

fn default_years() -> u32 {
    1
}

fn default_cost() -> f64 {
    500.0
}

fn default_currency_prefix() -> String {
    "Rs".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_idle_minutes() -> i64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    pub title: String,
    pub model: ModelParams,
    #[serde(default)]
    pub controls: ControlsConfig,
    pub labels: LabelConfig,
    #[serde(default)]
    pub alerts: AlertPolicy,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_temp_c")]
    pub default_temp_c: i32,
    #[serde(default = "default_years")]
    pub default_years: u32,
    #[serde(default = "default_cost")]
    pub default_cost: f64,
    #[serde(default)]
    pub block_selector: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            default_temp_c: default_temp_c(),
            default_years: default_years(),
            default_cost: default_cost(),
            block_selector: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub health_metric: String,
    #[serde(default = "default_currency_prefix")]
    pub currency_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: i64,
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Result<Duration> {
        if self.session_idle_minutes <= 0 {
            bail!("server.session_idle_minutes must be positive");
        }
        Duration::try_minutes(self.session_idle_minutes).ok_or_else(|| {
            anyhow!(
                "server.session_idle_minutes {} is too large",
                self.session_idle_minutes
            )
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_minutes: default_session_idle_minutes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// The two historical dashboards. They disagree on base rate, warning
/// threshold and projection horizon; neither is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    CommandCenter,
    BlockSelector,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::CommandCenter, Preset::BlockSelector];

    pub fn name(self) -> &'static str {
        match self {
            Preset::CommandCenter => "command-center",
            Preset::BlockSelector => "block-selector",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| {
                format!("unknown preset '{s}' (expected command-center or block-selector)")
            })
    }
}

impl DashboardConfig {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::CommandCenter => Self {
                name: preset.name().to_string(),
                title: "AI Predictive Battery Command Center".to_string(),
                model: ModelParams::command_center(),
                controls: ControlsConfig::default(),
                labels: LabelConfig {
                    health_metric: "Overall String Health".to_string(),
                    currency_prefix: default_currency_prefix(),
                },
                alerts: AlertPolicy::disabled(),
                server: ServerConfig::default(),
                logging: LoggingConfig::default(),
            },
            Preset::BlockSelector => Self {
                name: preset.name().to_string(),
                title: "AI Predictive Battery Command Center".to_string(),
                model: ModelParams::block_selector(),
                controls: ControlsConfig {
                    block_selector: true,
                    ..ControlsConfig::default()
                },
                labels: LabelConfig {
                    health_metric: "Block Health Status".to_string(),
                    currency_prefix: default_currency_prefix(),
                },
                alerts: AlertPolicy::default(),
                server: ServerConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: DashboardConfig =
            serde_yaml::from_str(text).context("Failed to parse dashboard config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        if model.base_rate < 0.0 || !model.base_rate.is_finite() {
            bail!("model.base_rate must be a non-negative number");
        }
        if model.grid_rate < 0.0 || !model.grid_rate.is_finite() {
            bail!("model.grid_rate must be a non-negative number");
        }
        if model.acceleration <= 0.0 || !model.acceleration.is_finite() {
            bail!("model.acceleration must be positive");
        }
        if !model.warning_threshold.is_finite() || !model.critical_threshold.is_finite() {
            bail!("model thresholds must be finite numbers");
        }
        if !model.risk_multiplier.is_finite() {
            bail!("model.risk_multiplier must be a finite number");
        }
        if model.critical_threshold > model.warning_threshold {
            bail!(
                "model.critical_threshold ({}) exceeds model.warning_threshold ({})",
                model.critical_threshold,
                model.warning_threshold
            );
        }
        if model.temp_min > model.temp_max {
            bail!("model.temp_min exceeds model.temp_max");
        }
        if model.year_max < 1 {
            bail!("model.year_max must be at least 1");
        }

        let controls = &self.controls;
        if !(model.temp_min..=model.temp_max).contains(&controls.default_temp_c) {
            bail!(
                "controls.default_temp_c {} outside [{}, {}]",
                controls.default_temp_c,
                model.temp_min,
                model.temp_max
            );
        }
        if !(1..=model.year_max).contains(&controls.default_years) {
            bail!(
                "controls.default_years {} outside [1, {}]",
                controls.default_years,
                model.year_max
            );
        }
        if controls.default_cost < 0.0 || !controls.default_cost.is_finite() {
            bail!("controls.default_cost must be a non-negative amount");
        }

        if self.alerts.warning_months_min > self.alerts.warning_months_max {
            bail!("alerts.warning_months_min exceeds alerts.warning_months_max");
        }
        self.server.idle_timeout()?;
        Ok(())
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<DashboardConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        DashboardConfig::from_yaml_str(&data)
            .with_context(|| format!("Invalid config {}", path.display()))
    }
}
