//! HTTP API server for external control (dashboard UI)
//!
//! This module provides a REST API for driving consultations:
//! - POST /sessions - Create a session from notes + persona
//! - GET  /sessions - List sessions
//! - GET  /sessions/:id - Fetch one session (with report when present)
//! - POST /sessions/:id/call/start - Open the realtime call
//! - POST /sessions/:id/call/stop - Finalize the call and synthesize the report
//! - GET  /sessions/:id/status - Call state, elapsed time, current speaker
//! - GET  /sessions/:id/transcript - Finalized utterances so far
//! - POST /personas/suggest - Suggest specialists for symptom notes
//! - GET  /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
