use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cellguard::{
    config::{ConfigLoader, DashboardConfig, Preset},
    dashboard::Dashboard,
    grid::BlockId,
    rng::RngManager,
    web::{self, WebServerConfig},
    AlertState, SimulationInput,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Battery string health dashboard")]
struct Cli {
    /// Path to a dashboard config YAML file (overrides --preset)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in preset to use when no config file is given
    #[arg(long, global = true, default_value = "command-center")]
    preset: Preset,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the dashboard over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Seed the jitter source (unseeded when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compute one dashboard frame and print it as JSON
    Render {
        #[arg(long)]
        temp: Option<i32>,
        #[arg(long)]
        years: Option<u32>,
        #[arg(long)]
        cost: Option<f64>,
        /// Target block, e.g. Block_7
        #[arg(long)]
        block: Option<BlockId>,
        #[arg(long)]
        seed: Option<u64>,
        /// Write the frame to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Walk every temperature through one alert state
    Sweep {
        #[arg(long)]
        years: Option<u32>,
        #[arg(long)]
        cost: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the built-in presets
    Presets,
}

fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cellguard={default_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    match &cli.config {
        Some(path) => ConfigLoader::new(".").load(path),
        None => Ok(DashboardConfig::preset(cli.preset)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging.level);
    info!(preset = %config.name, "loaded dashboard config");

    match cli.command {
        Command::Serve { host, port, seed } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            web::run(WebServerConfig {
                dashboard: config,
                host,
                port,
                seed,
            })
            .await?;
        }
        Command::Render {
            temp,
            years,
            cost,
            block,
            seed,
            out,
            pretty,
        } => {
            let dashboard = Dashboard::new(config);
            let defaults = dashboard.default_input();
            let mut input = SimulationInput::new(
                temp.unwrap_or(defaults.temp_c),
                years.unwrap_or(defaults.years),
                cost.unwrap_or(defaults.cost_per_block),
            );
            if let Some(block) = block {
                input = input.with_block(block);
            }
            let mut rng = RngManager::seeded_or_entropy(seed);
            let outcome =
                dashboard.render(&input, AlertState::default(), &mut rng.stream("render"))?;
            let json = if pretty {
                serde_json::to_string_pretty(&outcome.frame)?
            } else {
                serde_json::to_string(&outcome.frame)?
            };
            match out {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write frame to {}", path.display()))?;
                    info!(path = %path.display(), "frame written");
                }
                None => println!("{json}"),
            }
        }
        Command::Sweep { years, cost, seed } => {
            let dashboard = Dashboard::new(config);
            let defaults = dashboard.default_input();
            let years = years.unwrap_or(defaults.years);
            let cost = cost.unwrap_or(defaults.cost_per_block);
            let params = dashboard.model().params();
            let mut rng = RngManager::seeded_or_entropy(seed);
            let mut alert = AlertState::default();
            for temp in params.temp_min..=params.temp_max {
                let input = SimulationInput::new(temp, years, cost);
                let outcome = dashboard.render(&input, alert, &mut rng.stream("render"))?;
                alert = outcome.alert_state;
                let frame = outcome.frame;
                println!(
                    "{temp:>3} °C  health {:>6}  {:<8}  risk {}",
                    frame.metrics.health.value,
                    frame.metrics.status.label,
                    frame.metrics.risk.value
                );
                if let Some(note) = frame.notification {
                    println!("        {} {}", note.icon, note.message);
                }
            }
            if !dashboard.config().alerts.enabled {
                warn!(preset = %dashboard.config().name, "alerts are disabled for this preset");
            }
        }
        Command::Presets => {
            for preset in Preset::ALL {
                let config = DashboardConfig::preset(preset);
                let model = &config.model;
                println!(
                    "{:<15} base_rate={} grid_rate={} warning<{} critical<{} years=1..={} alerts={} block_selector={}",
                    config.name,
                    model.base_rate,
                    model.grid_rate,
                    model.warning_threshold,
                    model.critical_threshold,
                    model.year_max,
                    config.alerts.enabled,
                    config.controls.block_selector
                );
            }
        }
    }
    Ok(())
}
