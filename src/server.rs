use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    backend::ScanBackend,
    controller::{ScanController, ScanOutcome},
    error::ScanError,
    presenter,
    request::SCAN_LABELS,
};

pub struct AppState<B> {
    controller: Arc<ScanController<B>>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Status {
    pub in_flight: bool,
    pub state: String, // "idle" | "in_flight" | "succeeded" | "failed"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ScanOutcome> for Status {
    fn from(outcome: &ScanOutcome) -> Self {
        Self {
            in_flight: outcome.is_in_flight(),
            state: outcome.state_name().into(),
            error: outcome.error().map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanCommand {
    pub target: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Control API over one controller. `ui_dir`, when set, is served for every other path.
pub fn router<B>(controller: Arc<ScanController<B>>, ui_dir: Option<PathBuf>) -> Router
where
    B: ScanBackend + 'static,
{
    let state = AppState { controller };

    let api = Router::new()
        .route("/modes", get(get_modes))
        .route("/status", get(get_status::<B>))
        .route("/scan", post(post_scan::<B>))
        .route("/results", get(get_results::<B>))
        .route("/report", get(get_report::<B>))
        .with_state(state);

    let app = Router::new().nest("/api", api);
    let app = match ui_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => app,
    };
    app.layer(TraceLayer::new_for_http())
}

/// Serve the control API until `shutdown` is cancelled.
pub async fn serve<B>(
    bind: &str,
    controller: Arc<ScanController<B>>,
    ui_dir: Option<PathBuf>,
    shutdown: CancellationToken,
) -> Result<()>
where
    B: ScanBackend + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind control API on {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, "control API listening");
    axum::serve(listener, router(controller, ui_dir))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("control API server failed")?;
    Ok(())
}

async fn get_modes() -> impl IntoResponse {
    Json(SCAN_LABELS)
}

async fn get_status<B: ScanBackend + 'static>(State(app): State<AppState<B>>) -> impl IntoResponse {
    let outcome = app.controller.outcome();
    (StatusCode::OK, Json(Status::from(&outcome)))
}

async fn get_results<B: ScanBackend + 'static>(State(app): State<AppState<B>>) -> Response {
    match app.controller.outcome() {
        ScanOutcome::Succeeded(model) => (StatusCode::OK, Json(model.as_ref().clone())).into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn get_report<B: ScanBackend + 'static>(State(app): State<AppState<B>>) -> Response {
    match app.controller.outcome() {
        ScanOutcome::Succeeded(model) => (StatusCode::OK, Json(presenter::present(&model))).into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn post_scan<B: ScanBackend + 'static>(
    State(app): State<AppState<B>>,
    Json(cmd): Json<ScanCommand>,
) -> Response {
    match app.controller.spawn_scan(&cmd.target, &cmd.label) {
        // The scan settles in the background; callers poll /status.
        Ok(_task) => {
            let status = Status::from(&ScanOutcome::InFlight);
            (StatusCode::ACCEPTED, Json(status)).into_response()
        }
        Err(err) => {
            let code = match err {
                ScanError::Busy => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            };
            (code, Json(ErrorBody { error: err.to_string() })).into_response()
        }
    }
}
