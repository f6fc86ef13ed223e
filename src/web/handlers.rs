//! Request handlers for the download API.
//!
//! Error responses always carry a JSON body with an `"error"` key: 400 for
//! bad input or failed extraction, 404 for unknown or not-ready tasks.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::core::config;
use crate::download::metadata::fetch_video_info;
use crate::download::task::TaskStatus;
use crate::download::video::run_download_task;
use crate::web::frontend;
use crate::web::server::WebState;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality_label: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// GET / - the embedded frontend page.
pub async fn index_handler() -> Html<&'static str> {
    Html(frontend::INDEX_HTML)
}

/// GET /health - simple health check.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// POST /api/info - title, thumbnail and available qualities for a URL.
pub async fn info_handler(Json(req): Json<InfoRequest>) -> Response {
    let url = match Url::parse(&req.url) {
        Ok(url) => url,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid URL: {}", e)),
    };

    match fetch_video_info(&url).await {
        Ok(info) => Json(info).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

/// POST /api/download - register a task and start the download pipeline.
///
/// Returns the task id immediately; the work happens on a spawned task.
pub async fn download_handler(State(state): State<WebState>, Json(req): Json<DownloadRequest>) -> Response {
    let url = match Url::parse(&req.url) {
        Ok(url) => url,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid URL: {}", e)),
    };

    let task_id = state.registry.create().await;
    log::info!("Accepted download request for {} ({})", url, req.quality_label);

    tokio::spawn(run_download_task(
        Arc::clone(&state.registry),
        task_id.clone(),
        url,
        req.quality_label,
    ));

    Json(json!({ "task_id": task_id })).into_response()
}

/// GET /api/status/{task_id} - current state of a task.
pub async fn status_handler(State(state): State<WebState>, Path(task_id): Path<String>) -> Response {
    let Some(task) = state.registry.snapshot(&task_id).await else {
        return error_response(StatusCode::NOT_FOUND, "Task not found");
    };

    Json(json!({
        "status": task.status,
        "progress": task.progress,
        "message": task.message,
        "file_path": task.file_path.as_ref().map(|p| p.display().to_string()),
        "filename": task.filename,
    }))
    .into_response()
}

/// GET /api/fetch/{task_id} - stream the finished file, then forget the task.
///
/// Succeeds at most once per task: the task is taken out of the registry
/// before anything else, so concurrent fetches cannot both see it as
/// complete. A task that cannot be served is put back; once the file
/// handle is open the work directory is unlinked (the handle keeps the
/// bytes streamable) and the task stays gone.
pub async fn fetch_handler(State(state): State<WebState>, Path(task_id): Path<String>) -> Response {
    // Only one request can take the task out of the registry
    let Some(task) = state.registry.remove(&task_id).await else {
        return error_response(StatusCode::NOT_FOUND, "File not ready or task not found.");
    };
    if task.status != TaskStatus::Complete {
        state.registry.restore(&task_id, task).await;
        return error_response(StatusCode::NOT_FOUND, "File not ready or task not found.");
    }

    let Some(file_path) = task.file_path.clone() else {
        state.registry.restore(&task_id, task).await;
        return error_response(StatusCode::NOT_FOUND, "File not found.");
    };

    let file = match File::open(&file_path).await {
        Ok(file) => file,
        Err(e) => {
            log::error!("Task {}: failed to open {}: {}", task_id, file_path.display(), e);
            state.registry.restore(&task_id, task).await;
            return error_response(StatusCode::NOT_FOUND, "File not found.");
        }
    };
    let content_length = file.metadata().await.ok().map(|m| m.len());

    let work_dir = config::work_dir().join(&task_id);
    if work_dir.exists() {
        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            log::warn!("Failed to remove work dir {}: {}", work_dir.display(), e);
        }
    }
    log::info!("📤 Serving and forgetting task {}", task_id);

    let filename = task.filename.unwrap_or_else(|| "video.mp4".to_string());
    let body = Body::from_stream(ReaderStream::new(file));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    match builder.body(body) {
        Ok(response) => response,
        Err(e) => {
            log::error!("Failed to build fetch response: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}
