//! HTTP surface: progress queries, SSE streaming, snapshot triggers and
//! folder browsing

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use folio_errors::InventoryError;
use folio_progress::Subscription;
use folio_types::{OperationState, TreeNode};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects/{project_id}/snapshot", post(trigger_snapshot))
        .route(
            "/projects/{project_id}/snapshot/progress",
            get(progress).delete(cleanup_progress),
        )
        .route(
            "/projects/{project_id}/snapshot/progress/stream",
            get(progress_stream),
        )
        .route("/projects/{project_id}/rescan", post(rescan))
        .route("/projects/{project_id}/files", get(list_files))
        .route("/projects/{project_id}/files/tree", get(file_tree))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(app): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "trackedOperations": app.tracker.tracked_count(),
    }))
}

/// Point query; an untracked project reads as an explicit idle state, never
/// as an error.
async fn progress(
    State(app): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Json<OperationState> {
    let state = app
        .tracker
        .state(&project_id)
        .unwrap_or_else(|| OperationState::idle(&project_id));
    Json(state)
}

async fn cleanup_progress(
    State(app): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> StatusCode {
    app.tracker.cleanup(&project_id);
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRequest {
    #[serde(default)]
    access_token: String,
}

/// Kick off a detached snapshot run. Returns immediately; progress flows
/// through the tracker.
async fn trigger_snapshot(
    State(app): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Json(request): Json<TriggerRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    app.pipeline
        .start_detached(&project_id, &request.access_token)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "ok": true, "projectId": project_id })),
    ))
}

/// Live progress stream. Emits the current state first (when one exists),
/// then every delta, and closes after a terminal state is delivered.
async fn progress_stream(
    State(app): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before reading the point state so a terminal transition
    // between the two cannot slip past the stream.
    let sub = app.tracker.subscribe(&project_id);
    let pending = app.tracker.state(&project_id);

    struct Ctx {
        sub: Subscription,
        pending: Option<OperationState>,
        last_step: u8,
        done: bool,
    }

    let stream = futures::stream::unfold(
        Ctx {
            sub,
            pending,
            last_step: 0,
            done: false,
        },
        |mut ctx| async move {
            if ctx.done {
                return None;
            }
            loop {
                let state = match ctx.pending.take() {
                    Some(state) => state,
                    None => ctx.sub.recv().await?,
                };
                // Deltas buffered before the initial point read can lag it;
                // observers must never see the step number go backwards.
                if !state.is_terminal() && state.step_number < ctx.last_step {
                    continue;
                }
                ctx.last_step = state.step_number;
                ctx.done = state.is_terminal();
                let event = Event::default()
                    .event("progress")
                    .data(serde_json::to_string(&state).unwrap_or_default());
                return Some((Ok(event), ctx));
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Ask the sync daemon to rescan the project folder.
async fn rescan(
    State(app): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    app.sync.rescan(&project_id).await?;
    Ok(Json(json!({ "ok": true, "projectId": project_id })))
}

/// Depth-limited folder listing for browsing.
async fn list_files(
    State(app): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (status, files) = browse(&app, &project_id, app.config.snapshot.browse_depth).await?;
    Ok(Json(json!({
        "projectId": project_id,
        "files": files,
        "status": status,
    })))
}

/// Full hierarchical tree of the folder.
async fn file_tree(
    State(app): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (status, files) = browse(&app, &project_id, 0).await?;
    let tree: TreeNode = folio_inventory::build_tree(&files);
    Ok(Json(json!({
        "projectId": project_id,
        "tree": tree,
        "status": status,
    })))
}

async fn browse(
    app: &AppState,
    project_id: &str,
    depth: usize,
) -> Result<(folio_types::FolderStatus, Vec<folio_types::FileEntry>), ApiError> {
    use folio_sync::StatusSource;

    let status = app.sync.folder_status(project_id).await?;
    if status.path.as_os_str().is_empty() {
        return Err(InventoryError::PathUnavailable {
            folder_id: project_id.to_string(),
        }
        .into());
    }

    let root: PathBuf = status.path.clone();
    let files = tokio::task::spawn_blocking(move || folio_inventory::collect(&root, depth))
        .await
        .map_err(|e| folio_errors::Error::internal(e.to_string()))??;

    Ok((status, files))
}
