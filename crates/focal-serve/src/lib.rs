use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{header, Extensions, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use focal_core::{ClientInfo, Error as CoreError};
use focal_derive::{AnalyticsSnapshot, Tracker, ANALYTICS_UNAVAILABLE};
use focal_ledger::{FocalPaths, WorkspaceLock};
use focal_store::FocalConfig;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// ── Config ──

pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

// ── App State ──

struct AppState {
    tracker: Arc<Tracker>,
    started: Instant,
}

// ── Error Handling ──

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ── Entrypoint ──

pub async fn serve(root: &Path, config: ServeConfig) -> anyhow::Result<()> {
    let paths = FocalPaths::discover(root);
    if !paths.is_initialized() {
        anyhow::bail!("not a focal workspace (run `focal init` first)");
    }
    // Held for the server's lifetime: one writer process per workspace.
    let _lock = WorkspaceLock::acquire(&paths)?;

    let focal_config = FocalConfig::load(&paths.config_json)?;
    let tracker = Arc::new(Tracker::open(&paths, &focal_config)?);
    let app = router(tracker, config.static_dir.as_deref());

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        log = %paths.sessions_jsonl.display(),
        cache_ttl_secs = focal_config.cache_ttl_secs,
        "focal HTTP server listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await?;
    Ok(())
}

/// Build the router (for testing without binding to a port).
pub fn router(tracker: Arc<Tracker>, static_dir: Option<&Path>) -> Router {
    let state = Arc::new(AppState {
        tracker,
        started: Instant::now(),
    });
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/log-session", post(post_log_session))
        .route("/api/analytics", get(get_analytics))
        .route("/api/export", get(get_export));
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── GET /health ──

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    // Never triggers a recompute; "loading..." after a write until the next read.
    let total_sessions = match state.tracker.cache().peek() {
        Some(snap) => serde_json::json!(snap.total_sessions),
        None => serde_json::json!("loading..."),
    };
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "uptime": state.started.elapsed().as_secs_f64(),
        "totalSessions": total_sessions,
    }))
}

// ── POST /api/log-session ──

#[derive(Serialize)]
struct LogSessionResponse {
    success: bool,
    message: &'static str,
    id: String,
}

fn failure(status: StatusCode, error: &str, detail: Option<String>) -> Response {
    let mut body = serde_json::json!({ "success": false, "error": error });
    if let Some(detail) = detail {
        body["detail"] = serde_json::Value::String(detail);
    }
    (status, Json(body)).into_response()
}

fn client_info(extensions: &Extensions, headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        ip: extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

async fn post_log_session(
    State(state): State<Arc<AppState>>,
    extensions: Extensions,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return failure(
                StatusCode::BAD_REQUEST,
                "Invalid session data",
                Some(e.to_string()),
            )
        }
    };
    let client = client_info(&extensions, &headers);

    let tracker = state.tracker.clone();
    let result =
        tokio::task::spawn_blocking(move || tracker.submit_session(&payload, client)).await;

    match result {
        Ok(Ok(receipt)) => Json(LogSessionResponse {
            success: true,
            message: "Session logged successfully",
            id: receipt.id,
        })
        .into_response(),
        Ok(Err(CoreError::Validation(e))) => failure(
            StatusCode::BAD_REQUEST,
            "Invalid session data",
            Some(e.to_string()),
        ),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to log session");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log session", None)
        }
        Err(e) => {
            tracing::error!(error = %e, "log-session task failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log session", None)
        }
    }
}

// ── GET /api/analytics ──

async fn get_analytics(State(state): State<Arc<AppState>>) -> Json<AnalyticsSnapshot> {
    let tracker = state.tracker.clone();
    let snapshot = match tokio::task::spawn_blocking(move || tracker.analytics()).await {
        Ok(snapshot) => AnalyticsSnapshot::clone(&snapshot),
        Err(e) => {
            tracing::error!(error = %e, "analytics task failed");
            AnalyticsSnapshot::failed(ANALYTICS_UNAVAILABLE)
        }
    };
    Json(snapshot)
}

// ── GET /api/export ──

async fn get_export(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let tracker = state.tracker.clone();
    let records = match tokio::task::spawn_blocking(move || tracker.export_all()).await? {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, "export failed");
            return Err(AppError(anyhow::anyhow!("Failed to export data")));
        }
    };

    let filename = format!("focus_sessions_{}.json", Utc::now().format("%Y-%m-%d"));
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )],
        Json(records),
    )
        .into_response())
}

// ── Tests ──
