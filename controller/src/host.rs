use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use plantcare_common::{ControlMode, Device, RegistryError, RuntimeConfig, ScheduleWindow};

use crate::{
    backend::{build_client, BackendError, HttpBackend, HttpCamera},
    notify::Notifier,
    poller::Poller,
    session::Session,
    store::{Cache, CacheStore},
};

const DEFAULT_DATA_DIR: &str = ".plantcare";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct WindowEdit {
    on: String,
    off: String,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let data_dir = std::env::var("PLANTCARE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
    let store = CacheStore::new(&data_dir);

    let mut runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from store: {err:#}");
        RuntimeConfig::default()
    });
    apply_env_overrides(&mut runtime, |key| std::env::var(key).ok());
    runtime.sanitize();

    let cache = store.load().await.unwrap_or_else(|err| {
        warn!("failed to load cached device view, starting from defaults: {err:#}");
        Cache::default()
    });

    let client = build_client(&runtime.backend).context("failed to build http client")?;
    let backend = Arc::new(HttpBackend::new(client.clone(), &runtime.backend.base_url));
    let camera = Arc::new(HttpCamera::new(client, &runtime.backend.camera_url));
    let notifier = Notifier::new(runtime.api.notification_history);

    let session = Arc::new(Session::new(backend, camera, store, notifier, cache));
    let poller = Poller::spawn(session.clone(), runtime.polling.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], runtime.api.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control api at {addr}"))?;

    info!(
        "controller listening on http://{addr}, backend {} camera {}",
        runtime.backend.base_url, runtime.backend.camera_url
    );
    axum::serve(listener, router(session))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.shutdown().await;
    Ok(())
}

fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/devices/toggle", post(handle_toggle_device))
        .route("/api/mode", post(handle_set_mode))
        .route(
            "/api/schedule",
            get(handle_get_schedule).put(handle_put_schedule),
        )
        .route("/api/sync", post(handle_sync))
        .route("/api/notifications", get(handle_get_notifications))
        .route("/api/camera/status", get(handle_get_camera_status))
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

fn apply_env_overrides(runtime: &mut RuntimeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("PLANTCARE_BACKEND_URL") {
        runtime.backend.base_url = url;
    }
    if let Some(url) = lookup("PLANTCARE_CAMERA_URL") {
        runtime.backend.camera_url = url;
    }
    if let Some(port) = lookup("PLANTCARE_HTTP_PORT") {
        match port.parse::<u16>() {
            Ok(port) => runtime.api.http_port = port,
            Err(_) => warn!("ignoring invalid PLANTCARE_HTTP_PORT {port:?}"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn handle_get_status(State(session): State<Arc<Session>>) -> impl IntoResponse {
    Json(session.status().await)
}

async fn handle_toggle_device(
    State(session): State<Arc<Session>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(name) = params.get("device") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'device' parameter");
    };
    let device = match name.parse::<Device>() {
        Ok(device) => device,
        Err(err) => return registry_error_response(&err),
    };

    match session.toggle_device(device).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => backend_error_response(&err),
    }
}

async fn handle_set_mode(
    State(session): State<Arc<Session>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };
    let Ok(mode) = value.parse::<ControlMode>() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid mode. Use 'manual', 'schedule' or 'sensor'",
        );
    };

    if let Err(err) = session.request_mode_change(mode).await {
        return backend_error_response(&err);
    }
    Json(session.status().await).into_response()
}

async fn handle_get_schedule(State(session): State<Arc<Session>>) -> impl IntoResponse {
    Json(session.schedule().await)
}

async fn handle_put_schedule(
    State(session): State<Arc<Session>>,
    Json(edits): Json<BTreeMap<String, WindowEdit>>,
) -> impl IntoResponse {
    let mut parsed = Vec::with_capacity(edits.len());
    for (name, edit) in &edits {
        let device = match name.parse::<Device>() {
            Ok(device) => device,
            Err(err) => return registry_error_response(&err),
        };
        if let Err(err) = ScheduleWindow::from_display(&edit.on, &edit.off) {
            return error_response(StatusCode::BAD_REQUEST, &format!("{device}: {err}"));
        }
        parsed.push((device, edit));
    }

    for (device, edit) in parsed {
        if let Err(err) = session.edit_window(device, &edit.on, &edit.off).await {
            return error_response(StatusCode::BAD_REQUEST, &format!("{device}: {err}"));
        }
    }

    match session.save_schedule().await {
        Ok(schedule) => Json(schedule).into_response(),
        Err(err) => error_response(StatusCode::BAD_GATEWAY, &err.to_string()),
    }
}

async fn handle_sync(State(session): State<Arc<Session>>) -> impl IntoResponse {
    Json(session.sync(true).await)
}

async fn handle_get_notifications(State(session): State<Arc<Session>>) -> impl IntoResponse {
    Json(session.notifications())
}

async fn handle_get_camera_status(State(session): State<Arc<Session>>) -> impl IntoResponse {
    match session.camera_status().await {
        Ok(status) => Json(status).into_response(),
        Err(err) => backend_error_response(&err),
    }
}

fn registry_error_response(err: &RegistryError) -> axum::response::Response {
    error_response(StatusCode::NOT_FOUND, &err.to_string())
}

fn backend_error_response(err: &BackendError) -> axum::response::Response {
    error_response(StatusCode::BAD_GATEWAY, &err.to_string())
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
