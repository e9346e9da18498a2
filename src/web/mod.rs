mod assets;

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::DashboardConfig,
    dashboard::{Dashboard, DashboardFrame},
    grid::BlockId,
    model::{ModelError, SimulationInput},
    rng::RngManager,
    session::SessionStore,
};

pub struct AppState {
    dashboard: Dashboard,
    sessions: Mutex<SessionStore>,
    rng: Mutex<RngManager>,
}

impl AppState {
    pub fn new(config: DashboardConfig, seed: Option<u64>) -> Result<Self> {
        let idle = config.server.idle_timeout()?;
        Ok(Self {
            dashboard: Dashboard::new(config),
            sessions: Mutex::new(SessionStore::new(idle)),
            rng: Mutex::new(RngManager::seeded_or_entropy(seed)),
        })
    }
}

pub struct WebServerConfig {
    pub dashboard: DashboardConfig,
    pub host: String,
    pub port: u16,
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    Internal(String),
}

impl From<ModelError> for ApiError {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/config", get(dashboard_config))
        .route("/api/render", get(render))
        .route("/api/session/:id", delete(end_session))
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        dashboard,
        host,
        port,
        seed,
    } = config;

    let preset = dashboard.name.clone();
    let state = Arc::new(AppState::new(dashboard, seed)?);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, preset = %preset, "dashboard live at http://{addr} (Ctrl+C to stop)");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down dashboard");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        assets::APP_JS,
    )
}

#[derive(Serialize)]
struct SliderBounds {
    min: i64,
    max: i64,
    default: i64,
}

#[derive(Serialize)]
struct ConfigResponse {
    preset: String,
    title: String,
    health_label: String,
    currency_prefix: String,
    temperature: SliderBounds,
    years: SliderBounds,
    default_cost: f64,
    blocks: Option<Vec<BlockId>>,
    alerts: bool,
}

async fn dashboard_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let config = state.dashboard.config();
    let blocks = config
        .controls
        .block_selector
        .then(|| BlockId::all().collect());
    Json(ConfigResponse {
        preset: config.name.clone(),
        title: config.title.clone(),
        health_label: config.labels.health_metric.clone(),
        currency_prefix: config.labels.currency_prefix.clone(),
        temperature: SliderBounds {
            min: config.model.temp_min.into(),
            max: config.model.temp_max.into(),
            default: config.controls.default_temp_c.into(),
        },
        years: SliderBounds {
            min: 1,
            max: config.model.year_max.into(),
            default: config.controls.default_years.into(),
        },
        default_cost: config.controls.default_cost,
        blocks,
        alerts: config.alerts.enabled,
    })
}

#[derive(Debug, Deserialize)]
struct RenderQuery {
    temp: Option<i32>,
    years: Option<u32>,
    cost: Option<f64>,
    block: Option<String>,
    session: Option<Uuid>,
}

#[derive(Serialize)]
struct RenderResponse {
    session: Uuid,
    frame: DashboardFrame,
}

async fn render(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RenderQuery>,
) -> Result<Json<RenderResponse>, ApiError> {
    let defaults = state.dashboard.default_input();
    let mut input = SimulationInput::new(
        query.temp.unwrap_or(defaults.temp_c),
        query.years.unwrap_or(defaults.years),
        query.cost.unwrap_or(defaults.cost_per_block),
    );
    if let Some(block) = query.block.as_deref().filter(|b| !b.is_empty()) {
        input = input.with_block(block.parse()?);
    }
    let session = query.session.unwrap_or_else(Uuid::new_v4);

    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session store lock poisoned".into()))?;
    let now = Utc::now();
    let evicted = sessions.evict_idle(now);
    if evicted > 0 {
        info!(evicted, "dropped idle sessions");
    }

    let alert_state = sessions.alert_state(session);
    let outcome = {
        let mut rng = state
            .rng
            .lock()
            .map_err(|_| ApiError::Internal("rng lock poisoned".into()))?;
        state
            .dashboard
            .render(&input, alert_state, &mut rng.stream("render"))
    };
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(%session, error = %err, "rejected render request");
            return Err(err.into());
        }
    };
    sessions.commit(session, outcome.alert_state, now);
    drop(sessions);

    if let Some(note) = &outcome.frame.notification {
        info!(%session, status = note.status.label(), "alert fired");
    }

    Ok(Json(RenderResponse {
        session,
        frame: outcome.frame,
    }))
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session store lock poisoned".into()))?;
    if sessions.end(id) {
        info!(session = %id, "session ended");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}
