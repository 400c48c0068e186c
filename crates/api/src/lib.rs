//! SmartSession API Server
//!
//! HTTP and WebSocket server: participants stream frames over
//! `/ws/student` and receive a status plus their session timeline back
//! after every frame.

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use proctor::{LandmarkSet, PerceptionOracle, ProctorConfig, ProctorError, StaticOracle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod routes;
pub mod settings;

pub use settings::{LoggingSettings, PerceptionSettings, ServerSettings, Settings};

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid proctoring setup: {0}")]
    Proctor(#[from] ProctorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics recorder setup failed: {0}")]
    Metrics(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Application state shared across handlers
pub struct AppState {
    /// Perception backend shared by every session
    pub oracle: Arc<dyn PerceptionOracle>,
    /// Thresholds handed to each new session
    pub proctor: ProctorConfig,
    /// Per-session outbound queue depth
    pub outbound_queue: usize,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Connected participants
    pub active_sessions: AtomicUsize,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state with an explicit oracle
    pub fn new(proctor: ProctorConfig, oracle: Arc<dyn PerceptionOracle>) -> Self {
        Self {
            oracle,
            proctor,
            outbound_queue: ServerSettings::default().outbound_queue,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            active_sessions: AtomicUsize::new(0),
            metrics: None,
        }
    }

    /// Create application state from loaded settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        settings.proctor.validate()?;

        let landmarks = settings.perception.landmarks.then(LandmarkSet::neutral);
        let oracle = StaticOracle::new(settings.perception.face_count, landmarks);

        Ok(Self {
            outbound_queue: settings.server.outbound_queue.max(1),
            ..Self::new(settings.proctor.clone(), Arc::new(oracle))
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::health::liveness))
        .route("/api/v1/health", get(routes::health::health_handler))
        .route("/metrics", get(routes::health::metrics_handler))
        .route("/ws/student", get(routes::student::student_ws))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> Result<(), ApiError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ApiError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, ApiError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: Settings) -> Result<(), ApiError> {
    let mut state = AppState::from_settings(&settings)?;
    if settings.server.metrics {
        state = state.with_metrics(init_metrics()?);
    }

    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", settings.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
