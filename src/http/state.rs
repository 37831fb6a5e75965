use crate::call::CallSessionController;
use crate::report::{GenerationBackend, PersonaSuggester, ReportSynthesisPipeline};
use crate::session::SessionStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub pipeline: Arc<ReportSynthesisPipeline>,
    pub suggester: Arc<PersonaSuggester>,

    /// NATS server the per-session call transports subscribe on
    pub nats_url: String,

    /// Live call controllers (session_id → controller)
    pub calls: Arc<RwLock<HashMap<String, Arc<CallSessionController>>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn GenerationBackend>,
        nats_url: impl Into<String>,
    ) -> Self {
        let pipeline = Arc::new(ReportSynthesisPipeline::new(backend.clone(), store.clone()));
        let suggester = Arc::new(PersonaSuggester::new(backend));

        Self {
            store,
            pipeline,
            suggester,
            nats_url: nats_url.into(),
            calls: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
