use thiserror::Error;

/// Failure taxonomy for report synthesis.
///
/// `BackendUnavailable` is transient and eligible for caller-level retry;
/// the content errors are not, since the same input will produce the same
/// broken output. `MalformedReport` keeps the raw backend text so a broken
/// reply is never silently discarded.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("transcript is empty; nothing to summarize")]
    EmptyTranscript,

    #[error("generation backend unavailable: {message}")]
    BackendUnavailable {
        /// Upstream HTTP status, when the backend answered at all
        status: Option<u16>,
        message: String,
    },

    #[error("generation backend returned an empty reply")]
    EmptyBackendReply,

    #[error("malformed report from backend: {reason}")]
    MalformedReport {
        reason: String,
        /// Raw backend text, preserved for diagnosis
        raw: String,
    },

    #[error("failed to persist report: {0}")]
    PersistenceFailed(String),
}
