use super::types::{Speaker, Utterance};

/// Accumulates turn-by-turn speech events into an ordered transcript.
///
/// Final utterances are appended in arrival order and never reordered.
/// Partial utterances are transient per-speaker state: each one replaces
/// the previous partial for that speaker, and a final from the same
/// speaker clears the buffer. Only finals ever reach `snapshot()`.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    finals: Vec<Utterance>,
    partial_assistant: Option<String>,
    partial_patient: Option<String>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized utterance and clear that speaker's partial buffer.
    pub fn append_final(&mut self, utterance: Utterance) {
        *self.partial_slot(utterance.speaker) = None;
        self.finals.push(utterance);
    }

    /// Replace the in-progress text for a speaker's current turn.
    pub fn set_partial(&mut self, speaker: Speaker, text: impl Into<String>) {
        *self.partial_slot(speaker) = Some(text.into());
    }

    /// Current in-progress text for a speaker, or empty if none.
    pub fn peek_partial(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Assistant => self.partial_assistant.as_deref().unwrap_or(""),
            Speaker::Patient => self.partial_patient.as_deref().unwrap_or(""),
        }
    }

    /// Ordered read-only view of the finalized transcript.
    pub fn snapshot(&self) -> &[Utterance] {
        &self.finals
    }

    pub fn len(&self) -> usize {
        self.finals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finals.is_empty()
    }

    /// Drop all accumulated state for a fresh call attempt.
    pub fn clear(&mut self) {
        self.finals.clear();
        self.partial_assistant = None;
        self.partial_patient = None;
    }

    fn partial_slot(&mut self, speaker: Speaker) -> &mut Option<String> {
        match speaker {
            Speaker::Assistant => &mut self.partial_assistant,
            Speaker::Patient => &mut self.partial_patient,
        }
    }
}
