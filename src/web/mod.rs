// src/web/mod.rs

//! HTTP front door: the entry page, scan submission, report download and
//! feedback. State is explicit and shared; a report is fetched by the id the
//! scan response handed out, never by session.

mod error;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::core::models::ScanResult;
use crate::core::report::store::ReportStore;
use crate::core::scanner::Scanner;
use crate::error::{Result, ScanError};
use crate::storage::Database;

pub use self::error::ApiError;

const INDEX_HTML: &str = include_str!("index.html");

pub struct AppState {
    pub scanner: Scanner,
    pub reports: ReportStore,
    /// `None` when persistence is disabled.
    pub database: Option<Database>,
}

impl AppState {
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let database = if settings.persistence_enabled() {
            Some(Database::connect(&settings.database_url).await?)
        } else {
            info!("Persistence disabled, scans and feedback will not be recorded.");
            None
        };
        Ok(Self {
            scanner: Scanner::new(settings)?,
            reports: ReportStore::new(settings.reports_dir.clone()),
            database,
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/scan", post(scan_handler))
        .route("/download_report/:report_id", get(download_report_handler))
        .route("/feedback", post(feedback_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `settings.bind` and serves until Ctrl-C.
pub async fn serve(settings: &Settings) -> Result<()> {
    let state = Arc::new(AppState::from_settings(settings).await?);
    let listener = TcpListener::bind(&settings.bind).await?;
    info!(addr = %listener.local_addr()?, "Listening.");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutting down.");
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    status: &'static str,
    results: ScanResult,
    report_url: String,
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    message: String,
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn scan_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ScanRequest>, JsonRejection>,
) -> std::result::Result<Json<ScanResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(url = %request.url, "Scan requested.");

    let results = state.scanner.run_scan(&request.url).await?;

    // PDF layout and the file write are blocking work.
    let store = state.reports.clone();
    let for_report = results.clone();
    let handle = tokio::task::spawn_blocking(move || store.render(&for_report, &for_report.target))
        .await
        .map_err(|e| {
            error!(panic = %e, "Report rendering task panicked!");
            ApiError::from(ScanError::Render(format!("Task panicked: {}", e)))
        })??;

    if let Some(db) = &state.database {
        if let Err(e) = db.record_scan(&results.target, &results).await {
            warn!(error = %e, "Failed to record scan.");
        }
    }

    Ok(Json(ScanResponse {
        status: "success",
        report_url: format!("/download_report/{}", handle.id),
        results,
    }))
}

async fn download_report_handler(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Response {
    let Some(path) = state.reports.path_for(&report_id) else {
        return (StatusCode::NOT_FOUND, "Report not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"report_{}.pdf\"", report_id);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/pdf".to_string()), (header::CONTENT_DISPOSITION, disposition)],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Report disappeared before it could be read.");
            (StatusCode::NOT_FOUND, "Report not found").into_response()
        }
    }
}

async fn feedback_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<FeedbackRequest>, JsonRejection>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Feedback storage is disabled".to_string()))?;

    db.record_feedback(request.email.as_deref(), &request.message).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "status": "success" }))))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
