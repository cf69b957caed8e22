//! Notifier HTTP routes — post-build notifications and Rally action views.

pub mod notify;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use crate::models::artifact::Artifact;
use crate::models::build_data::BuildData;
use crate::services::action_store::ActionStore;
use crate::services::notifier::Notifier;

/// Shared state for notifier route handlers.
#[derive(Clone)]
pub struct NotifierState {
    pub notifier: Arc<Notifier>,
    pub store: Arc<ActionStore>,
    pub notify_secret: String,
}

/// Build the notifier's Axum router.
pub fn notifier_router(state: NotifierState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/notify", post(notify_handler))
        // Rally action views
        .route("/builds/{job}/{build}/rally", get(action_handler))
        .route("/builds/{job}/{build}/rally/defects", get(defects_handler))
        .route("/builds/{job}/{build}/rally/user-stories", get(user_stories_handler))
        .with_state(state)
}

async fn health(State(state): State<NotifierState>) -> Json<Value> {
    Json(json!({ "status": "ok", "actions": state.store.len() }))
}

async fn notify_handler(
    State(state): State<NotifierState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<notify::NotifyResponse>), (StatusCode, Json<notify::NotifyFailure>)> {
    crate::metrics::notification_received();

    notify::handle_notify(&state.notifier, &state.store, &state.notify_secret, &headers, body).await
}

fn find_action(state: &NotifierState, job: &str, build: &str) -> Result<Arc<BuildData>, StatusCode> {
    state.store.get(job, build).ok_or(StatusCode::NOT_FOUND)
}

async fn action_handler(
    State(state): State<NotifierState>,
    Path((job, build)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    let data = find_action(&state, &job, &build)?;
    let mut view = serde_json::to_value(&*data).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    view["artifacts"] = serde_json::to_value(data.artifacts()).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(view))
}

async fn defects_handler(
    State(state): State<NotifierState>,
    Path((job, build)): Path<(String, String)>,
) -> Result<Json<Vec<Artifact>>, StatusCode> {
    find_action(&state, &job, &build).map(|data| Json(data.defects()))
}

async fn user_stories_handler(
    State(state): State<NotifierState>,
    Path((job, build)): Path<(String, String)>,
) -> Result<Json<Vec<Artifact>>, StatusCode> {
    find_action(&state, &job, &build).map(|data| Json(data.user_stories()))
}
