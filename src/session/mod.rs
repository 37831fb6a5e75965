//! Consultation session state
//!
//! This module provides the session data model and its collaborators:
//! - `Session`/`Persona`/`Utterance` records
//! - `TranscriptAggregator` for partial/final speech accumulation
//! - `SessionStore` persistence contract with an in-memory implementation

mod store;
mod transcript;
mod types;

pub use store::{InMemorySessionStore, SessionPatch, SessionStore, StoreError};
pub use transcript::TranscriptAggregator;
pub use types::{Persona, Session, Speaker, Utterance};
