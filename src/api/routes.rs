use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::detection::{analyze, detect, detect_batch, get_config, index};
use super::health::health_check;
use super::sessions::{
    create_session, delete_session, get_session, reset_session, submit_frame, submit_keypoints,
};
use super::state::AppState;

pub fn create_routes(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.limits.max_body_bytes);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/config", get(get_config))
        .route("/detect", post(detect))
        .route("/detect_batch", post(detect_batch))
        .route("/analyze", post(analyze))
        .merge(session_routes())
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/frames", post(submit_frame))
        .route("/sessions/:id/keypoints", post(submit_keypoints))
        .route("/sessions/:id/reset", post(reset_session))
}
