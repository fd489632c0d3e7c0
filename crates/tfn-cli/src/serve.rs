//! HTTP dashboard server.
//!
//! `GET /` serves the embedded page; `GET /api/dashboard` re-runs the
//! whole pipeline with the request's query parameters and returns the
//! payload. One run per interaction, no state between runs except the
//! dataset cache, which is shared across requests so unchanged files are
//! parsed once.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::{info, warn};

use tfn_analysis::metrics::SizeMetric;
use tfn_dashboard::page;
use tfn_dashboard::view::{run_pipeline, DashboardData, RenderParams};
use tfn_data::cache::DatasetCache;

/// Shared across requests: where the dataset lives and the parse cache.
pub struct AppState {
    data_path: PathBuf,
    cache: DatasetCache,
}

/// Query-string parameters; anything omitted falls back to the defaults.
#[derive(Debug, Deserialize)]
struct DashboardQuery {
    size_metric: Option<SizeMetric>,
    edge_width: Option<bool>,
    physics: Option<bool>,
    connected_only: Option<bool>,
    min_fee: Option<f64>,
}

impl DashboardQuery {
    fn into_params(self) -> RenderParams {
        let defaults = RenderParams::default();
        RenderParams {
            size_metric: self.size_metric.unwrap_or(defaults.size_metric),
            edge_width_by_value: self.edge_width.unwrap_or(defaults.edge_width_by_value),
            physics: self.physics.unwrap_or(defaults.physics),
            connected_only: self.connected_only.unwrap_or(defaults.connected_only),
            min_fee_millions: self.min_fee.unwrap_or(defaults.min_fee_millions),
        }
    }
}

async fn page_handler() -> Html<String> {
    Html(page::render_live())
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let params = query.into_params();
    match run(&state, &params) {
        Ok(data) => Json(data).into_response(),
        Err(err) => {
            // The run is over; the server stays up for the next change.
            warn!(error = %err, "pipeline run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

fn run(state: &AppState, params: &RenderParams) -> Result<DashboardData> {
    let records = state.cache.load(&state.data_path)?;
    run_pipeline(&records, params)
}

/// Build the router; split out for tests.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
///
/// # Errors
/// Returns error if the port cannot be bound or the server fails.
pub async fn run_server(data_path: PathBuf, port: u16) -> Result<()> {
    let state = Arc::new(AppState {
        data_path,
        cache: DatasetCache::new(),
    });
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;

    info!("dashboard listening on {}", listener.local_addr()?);
    info!("  - GET  /                (dashboard page)");
    info!("  - GET  /api/dashboard   (pipeline run as JSON)");

    axum::serve(listener, app)
        .await
        .wrap_err("server terminated unexpectedly")?;
    Ok(())
}
