use super::types::{Persona, Session, Utterance};
use crate::report::Report;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Fields a writer may upsert onto an existing session. `None` leaves the
/// stored value untouched; last write wins per supplied field.
#[derive(Debug, Default, Clone)]
pub struct SessionPatch {
    pub report: Option<Report>,
    pub transcript: Option<Vec<Utterance>>,
}

/// Durable session record keyed by session id.
///
/// The core only ever creates sessions and upserts `report`/`transcript`;
/// deletion belongs to collaborators. `update` is idempotent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, persona: Persona, notes: String) -> Result<String, StoreError>;

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    async fn list(&self) -> Result<Vec<Session>, StoreError>;

    async fn update(&self, session_id: &str, patch: SessionPatch) -> Result<(), StoreError>;
}

/// In-memory session store (session_id → session)
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, persona: Persona, notes: String) -> Result<String, StoreError> {
        let session_id = uuid::Uuid::new_v4().to_string();

        let session = Session {
            id: session_id.clone(),
            persona,
            intake_notes: notes,
            transcript: Vec::new(),
            report: None,
            created_at: Utc::now(),
        };

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), session);
        }

        info!("Created session: {}", session_id);

        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut all: Vec<Session> = sessions.values().cloned().collect();
        // Newest first, the order the dashboard shows history in
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, session_id: &str, patch: SessionPatch) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;

        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;

        if let Some(report) = patch.report {
            session.report = Some(report);
        }
        if let Some(transcript) = patch.transcript {
            session.transcript = transcript;
        }

        Ok(())
    }
}
