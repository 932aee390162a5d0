use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::detector;
use crate::error::ApiError;
use crate::grid::{Grid, GridRow};
use crate::snapshot::{SnapshotLog, SnapshotWriter};
use crate::stats::{StatsReport, StatsTracker};

const MUTANT_ANSWER: &str = "El sujeto es un mutante";
const HUMAN_ANSWER: &str = "El sujeto no es un mutante";

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<StatsTracker>,
    pub log: Arc<SnapshotLog>,
    pub writer: SnapshotWriter,
}

impl AppState {
    /// Spawns the snapshot writer, so it needs a running tokio runtime.
    pub fn new(log: SnapshotLog) -> Self {
        let log = Arc::new(log);
        Self {
            tracker: Arc::new(StatsTracker::new()),
            writer: SnapshotWriter::spawn(Arc::clone(&log)),
            log,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DnaRequest {
    pub dna: Vec<GridRow>,
}

#[derive(Debug, Serialize)]
pub struct DnaResponse {
    pub respuesta: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mutants", post(classify))
        .route("/stats", get(stats))
        .route("/stats-csv", get(stats_csv))
        .with_state(state)
}

async fn classify(
    State(state): State<AppState>,
    body: Result<Json<DnaRequest>, JsonRejection>,
) -> Result<Json<DnaResponse>, ApiError> {
    let Json(request) = body.map_err(|e| {
        warn!(action = "reject", component = "mutants", error = %e, "Invalid request body");
        ApiError::InvalidBody(e.body_text())
    })?;

    let grid = Grid::from_rows(&request.dna).map_err(|e| {
        warn!(action = "reject", component = "mutants", error = %e, "Malformed grid");
        ApiError::from(e)
    })?;

    let start_time = Instant::now();
    let size = grid.size();
    let is_mutant = if size >= detector::PARALLEL_MIN_SIDE {
        tokio::task::spawn_blocking(move || detector::is_mutant(&grid))
            .await
            .map_err(|e| ApiError::ClassificationFailed(e.to_string()))?
    } else {
        detector::is_mutant(&grid)
    };
    state.tracker.record(is_mutant);

    info!(
        action = "classify",
        component = "mutants",
        size,
        is_mutant,
        duration_ms = start_time.elapsed().as_millis(),
        "Grid classified"
    );

    let respuesta = if is_mutant { MUTANT_ANSWER } else { HUMAN_ANSWER };
    Ok(Json(DnaResponse { respuesta }))
}

async fn stats(State(state): State<AppState>) -> Json<StatsReport> {
    let counters = state.tracker.snapshot(&state.writer);
    Json(StatsReport::from(counters))
}

async fn stats_csv(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    state.writer.flush().await;

    let log = Arc::clone(&state.log);
    let rows = tokio::task::spawn_blocking(move || log.read_rows())
        .await
        .map_err(|_| ApiError::StatsLogUnavailable)??;
    Ok(Json(rows))
}

pub async fn serve(host: &str, port: u16, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    info!(
        action = "listen",
        component = "server",
        address = %listener.local_addr()?,
        stats_file = ?state.log.path(),
        "Server listening"
    );

    let writer = state.writer.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    writer.flush().await;
    info!(action = "stop", component = "server", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(action = "signal", component = "server", error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
