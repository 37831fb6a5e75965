use super::state::AppState;
use crate::call::{CallError, CallSessionController, CallState, CallStatus, NatsCallTransport};
use crate::report::{Report, SynthesisError};
use crate::session::{Persona, Session, Utterance};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Free-text symptom notes entered before the call
    #[serde(default)]
    pub notes: String,

    /// Specialist persona selected from the catalog
    pub persona: Persona,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallResponse {
    pub session_id: String,
    pub state: CallState,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCallResponse {
    pub session_id: String,
    pub state: CallState,
    pub duration_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestPersonasRequest {
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn call_error_status(e: &CallError) -> StatusCode {
    match e {
        CallError::AlreadyStarted(_) | CallError::NotActive(_) | CallError::NotFailed(_) => {
            StatusCode::CONFLICT
        }
        CallError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
        CallError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

fn synthesis_error_status(e: &SynthesisError) -> StatusCode {
    match e {
        SynthesisError::EmptyTranscript => StatusCode::BAD_REQUEST,
        SynthesisError::BackendUnavailable { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create a consultation session from intake notes and a persona
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    match state.store.create(req.persona, req.notes).await {
        Ok(session_id) => {
            info!("Session created: {}", session_id);
            (StatusCode::OK, Json(CreateSessionResponse { session_id })).into_response()
        }
        Err(e) => {
            error!("Failed to create session: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create session: {}", e),
            )
        }
    }
}

/// GET /sessions
/// List all sessions, newest first
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => {
            error!("Failed to list sessions: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list sessions: {}", e),
            )
        }
    }
}

/// GET /sessions/:session_id
/// Fetch one session, including the report when present
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&session_id).await {
        Ok(Some(session)) => (StatusCode::OK, Json(session)).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
        Err(e) => {
            error!("Failed to fetch session {}: {}", session_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch session: {}", e),
            )
        }
    }
}

/// POST /sessions/:session_id/call/start
/// Open the realtime call for a session
pub async fn start_call(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    // Reuse the live controller on retry; otherwise build one from the
    // stored session.
    let controller = {
        let calls = state.calls.read().await;
        calls.get(&session_id).cloned()
    };

    let controller = match controller {
        Some(controller) => controller,
        None => {
            let session: Session = match state.store.get(&session_id).await {
                Ok(Some(session)) => session,
                Ok(None) => {
                    return error_response(
                        StatusCode::NOT_FOUND,
                        format!("Session {} not found", session_id),
                    )
                }
                Err(e) => {
                    error!("Failed to fetch session {}: {}", session_id, e);
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to fetch session: {}", e),
                    );
                }
            };

            let transport = Box::new(NatsCallTransport::new(
                state.nats_url.clone(),
                session_id.clone(),
            ));
            let controller = Arc::new(CallSessionController::new(
                session,
                transport,
                state.pipeline.clone(),
            ));

            let mut calls = state.calls.write().await;
            calls
                .entry(session_id.clone())
                .or_insert_with(|| controller.clone())
                .clone()
        }
    };

    match controller.start().await {
        Ok(()) => {
            info!("Call starting for session: {}", session_id);
            (
                StatusCode::OK,
                Json(StartCallResponse {
                    session_id: session_id.clone(),
                    state: controller.state().await,
                    message: format!("Call starting for session {}", session_id),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to start call for {}: {}", session_id, e);
            error_response(call_error_status(&e), e.to_string())
        }
    }
}

/// POST /sessions/:session_id/call/stop
/// Finalize the call and synthesize the report
pub async fn stop_call(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let controller = {
        let calls = state.calls.read().await;
        calls.get(&session_id).cloned()
    };

    let Some(controller) = controller else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("No call for session {}", session_id),
        );
    };

    match controller.stop().await {
        Ok(outcome) => {
            // Terminal state; the controller has nothing left to do
            {
                let mut calls = state.calls.write().await;
                calls.remove(&session_id);
            }

            info!("Call stopped for session: {}", session_id);

            (
                StatusCode::OK,
                Json(StopCallResponse {
                    session_id,
                    state: CallState::Ended,
                    duration_secs: outcome.duration_secs,
                    report: outcome.report,
                    synthesis_error: outcome.synthesis_error.map(|e| e.to_string()),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to stop call for {}: {}", session_id, e);
            error_response(call_error_status(&e), e.to_string())
        }
    }
}

/// GET /sessions/:session_id/status
/// Call state, elapsed seconds and current speaker
pub async fn get_call_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    {
        let calls = state.calls.read().await;
        if let Some(controller) = calls.get(&session_id) {
            return (StatusCode::OK, Json(controller.status().await)).into_response();
        }
    }

    // No live call; report idle for a known session
    match state.store.get(&session_id).await {
        Ok(Some(session)) => (
            StatusCode::OK,
            Json(CallStatus {
                session_id,
                state: CallState::Idle,
                elapsed_secs: 0,
                current_speaker: None,
                transcript_len: session.transcript.len(),
                error: None,
            }),
        )
            .into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
        Err(e) => {
            error!("Failed to fetch session {}: {}", session_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch session: {}", e),
            )
        }
    }
}

/// GET /sessions/:session_id/transcript
/// Finalized utterances collected so far
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    {
        let calls = state.calls.read().await;
        if let Some(controller) = calls.get(&session_id) {
            let transcript: Vec<Utterance> = controller.transcript().await;
            return (StatusCode::OK, Json(transcript)).into_response();
        }
    }

    match state.store.get(&session_id).await {
        Ok(Some(session)) => (StatusCode::OK, Json(session.transcript)).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
        Err(e) => {
            error!("Failed to fetch session {}: {}", session_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch session: {}", e),
            )
        }
    }
}

/// POST /personas/suggest
/// Suggest suitable specialists for free-text symptom notes
pub async fn suggest_personas(
    State(state): State<AppState>,
    Json(req): Json<SuggestPersonasRequest>,
) -> impl IntoResponse {
    match state.suggester.suggest(&req.notes).await {
        Ok(personas) => (StatusCode::OK, Json(personas)).into_response(),
        Err(e) => {
            error!("Persona suggestion failed: {}", e);
            error_response(synthesis_error_status(&e), e.to_string())
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
