use crate::session::Speaker;
use serde::{Deserialize, Serialize};

/// Finality of a transcript fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    Partial,
    Final,
}

/// Call event published by the voice gateway on the session's subject.
///
/// The wire format is a JSON object tagged by `type`; only `transcript`
/// carries a payload the transcript pipeline cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CallEvent {
    CallStart,

    CallEnd,

    SpeechStart {
        speaker: Speaker,
    },

    SpeechEnd {
        speaker: Speaker,
    },

    #[serde(rename_all = "camelCase")]
    Transcript {
        speaker: Speaker,
        transcript_type: TranscriptKind,
        text: String,
    },

    /// Transport-level failure reported by the gateway
    Error {
        message: String,
    },
}
