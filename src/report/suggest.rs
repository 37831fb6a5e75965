use super::backend::GenerationBackend;
use super::error::SynthesisError;
use super::pipeline::strip_code_fences;
use crate::session::Persona;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Built-in specialist personas available for consultations.
pub fn specialist_catalog() -> Vec<Persona> {
    fn persona(
        specialist: &str,
        display_name: &str,
        description: &str,
        avatar: &str,
        voice_id: &str,
    ) -> Persona {
        Persona {
            specialist: specialist.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            avatar: avatar.to_string(),
            voice_id: Some(voice_id.to_string()),
        }
    }

    vec![
        persona(
            "General Physician",
            "Dr. Emily Carter",
            "You are a friendly general physician. Ask about the patient's symptoms, their duration and severity, and give practical everyday health advice.",
            "/avatars/general-physician.png",
            "chris",
        ),
        persona(
            "Pediatrician",
            "Dr. Daniel Reyes",
            "You are a calm pediatrician. Ask about the child's age, symptoms and behavior, and reassure the parent while gathering details.",
            "/avatars/pediatrician.png",
            "will",
        ),
        persona(
            "Dermatologist",
            "Dr. Aisha Rahman",
            "You are a dermatologist. Ask about skin changes, their location, duration and triggers, and suggest skin-care guidance.",
            "/avatars/dermatologist.png",
            "eileen",
        ),
        persona(
            "Psychologist",
            "Dr. Marcus Webb",
            "You are a supportive psychologist. Listen carefully, ask about mood, sleep and stress, and respond with empathy.",
            "/avatars/psychologist.png",
            "aaron",
        ),
        persona(
            "Nutritionist",
            "Dr. Sofia Lindgren",
            "You are a pragmatic nutritionist. Ask about eating habits, goals and restrictions, and give actionable diet advice.",
            "/avatars/nutritionist.png",
            "susan",
        ),
        persona(
            "Cardiologist",
            "Dr. Rajan Mehta",
            "You are a careful cardiologist. Ask about chest discomfort, breathlessness, palpitations and exercise tolerance.",
            "/avatars/cardiologist.png",
            "paul",
        ),
        persona(
            "ENT Specialist",
            "Dr. Hannah Cole",
            "You are an ENT specialist. Ask about ear, nose and throat symptoms, their onset and anything that makes them better or worse.",
            "/avatars/ent.png",
            "lily",
        ),
    ]
}

/// Suggests suitable specialist personas for free-text symptom notes by
/// asking the generation backend to pick from the catalog. The reply goes
/// through the same tolerant fence-strip/parse path as report synthesis,
/// then gets resolved against the catalog so the backend cannot invent
/// specialists.
pub struct PersonaSuggester {
    backend: Arc<dyn GenerationBackend>,
}

impl PersonaSuggester {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub async fn suggest(&self, notes: &str) -> Result<Vec<Persona>, SynthesisError> {
        let catalog = specialist_catalog();

        let system = serde_json::to_string(&catalog).map_err(|e| {
            SynthesisError::BackendUnavailable {
                status: None,
                message: format!("failed to render catalog: {}", e),
            }
        })?;

        let user = format!(
            "User Notes/Symptoms: {}. Based on the notes and symptoms, suggest a list of suitable doctors from the provided catalog. Return a JSON array of doctor objects only.",
            notes
        );

        let raw = self.backend.complete(&system, &user).await?;

        let stripped = strip_code_fences(&raw);
        if stripped.is_empty() {
            return Err(SynthesisError::EmptyBackendReply);
        }

        let suggested =
            parse_suggestions(stripped).map_err(|reason| SynthesisError::MalformedReport {
                reason,
                raw: raw.clone(),
            })?;

        // Resolve against the catalog; entries the catalog doesn't know are dropped
        let resolved: Vec<Persona> = suggested
            .into_iter()
            .filter_map(|candidate| {
                catalog
                    .iter()
                    .find(|p| p.specialist.eq_ignore_ascii_case(&candidate.specialist))
                    .cloned()
            })
            .collect();

        info!("Suggested {} specialist(s) for notes", resolved.len());

        Ok(resolved)
    }
}

/// Parse a suggestion reply: a bare JSON array, or a `{"doctors": [...]}`
/// wrapper, both of which backends produce in practice.
fn parse_suggestions(text: &str) -> Result<Vec<Persona>, String> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("doctors") {
            Some(Value::Array(items)) => items,
            _ => return Err("expected a JSON array or a {\"doctors\": [...]} object".to_string()),
        },
        _ => return Err("expected a JSON array of doctor objects".to_string()),
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<Persona>(item)
                .map_err(|e| format!("invalid doctor entry: {}", e))
        })
        .collect()
}
