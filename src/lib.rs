pub mod alert;
pub mod config;
pub mod curve;
pub mod dashboard;
pub mod grid;
pub mod model;
pub mod rng;
pub mod session;
pub mod web;

pub use alert::{AlertPolicy, AlertState, Notification};
pub use config::{ConfigLoader, DashboardConfig, Preset};
pub use dashboard::{Dashboard, DashboardFrame, RenderOutcome};
pub use model::{HealthModel, HealthResult, ModelError, ModelParams, SimulationInput, Status};
