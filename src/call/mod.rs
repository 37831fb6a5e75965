//! Realtime call session management
//!
//! This module owns the call lifecycle for a consultation:
//! - `CallSessionController` state machine (idle → connecting → active →
//!   ending → ended, with failed reachable on transport errors)
//! - `CallTransport` contract with the NATS-backed implementation
//! - The call-event wire format published by the voice gateway

mod controller;
mod events;
mod transport;

pub use controller::{CallError, CallSessionController, CallState, CallStatus, StopOutcome};
pub use events::{CallEvent, TranscriptKind};
pub use transport::{CallTransport, NatsCallTransport, TransportError};
