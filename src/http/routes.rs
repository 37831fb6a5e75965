use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route(
            "/sessions",
            post(handlers::create_session).get(handlers::list_sessions),
        )
        .route("/sessions/:session_id", get(handlers::get_session))
        // Call control
        .route(
            "/sessions/:session_id/call/start",
            post(handlers::start_call),
        )
        .route("/sessions/:session_id/call/stop", post(handlers::stop_call))
        // Call queries
        .route(
            "/sessions/:session_id/status",
            get(handlers::get_call_status),
        )
        .route(
            "/sessions/:session_id/transcript",
            get(handlers::get_transcript),
        )
        // Persona suggestion
        .route("/personas/suggest", post(handlers::suggest_personas))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
