use crate::report::Report;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the consultation produced a speech event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Assistant,
    Patient,
}

/// A single finalized speech turn fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,

    /// Transcribed text
    pub text: String,

    /// When this utterance was finalized
    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// AI specialist descriptor driving the live conversation and the report
/// framing. Supplied by the persona catalog; immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Specialty shown to the user and rendered into prompts
    pub specialist: String,

    pub display_name: String,

    /// Prompt description of how the specialist behaves on the call
    pub description: String,

    /// Avatar image reference for the UI
    pub avatar: String,

    /// Voice profile used by the voice gateway, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

/// One consultation instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique identifier, assigned at creation
    pub id: String,

    pub persona: Persona,

    /// Free-text symptom notes entered before the call
    #[serde(default)]
    pub intake_notes: String,

    /// Finalized utterances in emission order
    #[serde(default)]
    pub transcript: Vec<Utterance>,

    /// Synthesized report, absent until the consultation completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,

    pub created_at: DateTime<Utc>,
}
