use super::backend::GenerationBackend;
use super::error::SynthesisError;
use super::prompt;
use super::types::Report;
use crate::session::{Session, SessionPatch, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Strip leading/trailing Markdown code-fence markers from a backend reply.
///
/// Generation backends are not guaranteed to honor "return only the JSON";
/// the structured payload routinely arrives wrapped in ```json fences.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Tolerate a language tag on the opening fence
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.trim_start();
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }

    text.trim()
}

/// Builds a synthesis request from transcript + persona, invokes the
/// generation backend, extracts a validated report from the free-form
/// reply, and writes it back through the session store.
///
/// The backend reply is treated as an untrusted external format: fence
/// stripping, then parse, then a required-field check. Persistence is
/// best-effort - a parsed report is returned to the caller even when the
/// store write fails.
pub struct ReportSynthesisPipeline {
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn SessionStore>,
}

impl ReportSynthesisPipeline {
    pub fn new(backend: Arc<dyn GenerationBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self { backend, store }
    }

    /// Whether the generation backend has a usable credential.
    pub fn backend_configured(&self) -> bool {
        self.backend.is_configured()
    }

    /// Synthesize a structured report for a completed session.
    pub async fn generate(&self, session: &Session) -> Result<Report, SynthesisError> {
        if session.transcript.is_empty() {
            return Err(SynthesisError::EmptyTranscript);
        }

        let user_payload = prompt::render_user_payload(session);

        info!(
            "Synthesizing report for session {} ({} utterances)",
            session.id,
            session.transcript.len()
        );

        let raw = self
            .backend
            .complete(prompt::REPORT_SYSTEM_PROMPT, &user_payload)
            .await?;

        let stripped = strip_code_fences(&raw);
        if stripped.is_empty() {
            return Err(SynthesisError::EmptyBackendReply);
        }

        let mut report: Report =
            serde_json::from_str(stripped).map_err(|e| SynthesisError::MalformedReport {
                reason: format!("invalid JSON: {}", e),
                raw: raw.clone(),
            })?;

        if let Err(reason) = report.validate() {
            return Err(SynthesisError::MalformedReport {
                reason,
                raw: raw.clone(),
            });
        }

        // The only field the pipeline may fill in after parsing
        if report.session_id.is_none() {
            report.session_id = Some(session.id.clone());
        }

        // Best-effort: the caller still gets the parsed report
        if let Err(e) = self.persist(session, &report).await {
            warn!("{}", e);
        }

        info!("Report synthesis complete for session {}", session.id);

        Ok(report)
    }

    async fn persist(&self, session: &Session, report: &Report) -> Result<(), SynthesisError> {
        let patch = SessionPatch {
            report: Some(report.clone()),
            transcript: Some(session.transcript.clone()),
        };

        self.store
            .update(&session.id, patch)
            .await
            .map_err(|e| SynthesisError::PersistenceFailed(e.to_string()))
    }
}
