// Tests for the report synthesis pipeline and the persona suggester,
// exercised against a stub generation backend (no network access).

use async_trait::async_trait;
use chrono::Utc;
use medvoice::{
    GenerationBackend, InMemorySessionStore, Persona, PersonaSuggester, ReportSynthesisPipeline,
    Session, SessionPatch, SessionStore, Speaker, StoreError, SynthesisError, Utterance,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Stub backend returning a canned reply (or a 503) and counting calls.
struct StubBackend {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl StubBackend {
    fn with_reply(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(SynthesisError::BackendUnavailable {
                status: Some(503),
                message: "stub backend down".to_string(),
            }),
        }
    }
}

/// Store whose writes always fail, for the best-effort persistence path.
struct FailingStore;

#[async_trait]
impl SessionStore for FailingStore {
    async fn create(&self, _persona: Persona, _notes: String) -> Result<String, StoreError> {
        Err(StoreError::Backend("read-only store".to_string()))
    }

    async fn get(&self, _session_id: &str) -> Result<Option<Session>, StoreError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<Session>, StoreError> {
        Ok(Vec::new())
    }

    async fn update(&self, _session_id: &str, _patch: SessionPatch) -> Result<(), StoreError> {
        Err(StoreError::Backend("disk full".to_string()))
    }
}

fn test_persona() -> Persona {
    Persona {
        specialist: "General Physician".to_string(),
        display_name: "Dr. Emily Carter".to_string(),
        description: "You are a friendly general physician.".to_string(),
        avatar: "/avatars/general-physician.png".to_string(),
        voice_id: Some("chris".to_string()),
    }
}

fn session_with_transcript(id: &str, transcript: Vec<Utterance>) -> Session {
    Session {
        id: id.to_string(),
        persona: test_persona(),
        intake_notes: "3 days of fever and cough".to_string(),
        transcript,
        report: None,
        created_at: Utc::now(),
    }
}

fn consultation_transcript() -> Vec<Utterance> {
    vec![
        Utterance::new(Speaker::Assistant, "I recommend rest and fluids"),
        Utterance::new(Speaker::Patient, "ok thank you"),
    ]
}

const VALID_REPORT: &str = r#"{
    "chiefComplaint": "fever and cough",
    "diagnosis": { "primary": "Viral infection", "reasoning": "Short febrile illness." },
    "treatmentPlan": { "medications": [ { "name": "Paracetamol", "dosage": "500mg" } ] },
    "warningSignsToWatch": ["Difficulty breathing"],
    "disclaimer": "AI-generated report"
}"#;

fn fenced(report: &str) -> String {
    format!("```json\n{}\n```", report)
}

#[tokio::test]
async fn test_empty_transcript_fails_without_backend_call() {
    let backend = StubBackend::with_reply(VALID_REPORT);
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend.clone(), store);

    let session = session_with_transcript("s-empty", Vec::new());
    let result = pipeline.generate(&session).await;

    assert!(matches!(result, Err(SynthesisError::EmptyTranscript)));
    assert_eq!(backend.calls(), 0, "precondition failure must not hit the backend");
}

#[tokio::test]
async fn test_fenced_reply_parses_and_backfills_session_id() {
    let backend = StubBackend::with_reply(&fenced(VALID_REPORT));
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend.clone(), store);

    let session = session_with_transcript("s-1", consultation_transcript());
    let report = pipeline.generate(&session).await.unwrap();

    assert_eq!(report.chief_complaint.as_deref(), Some("fever and cough"));
    assert_eq!(report.session_id.as_deref(), Some("s-1"));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_session_id_from_backend_is_kept() {
    let reply = r#"{
        "sessionId": "from-model",
        "chiefComplaint": "fever",
        "diagnosis": { "primary": "Viral infection" },
        "treatmentPlan": { "medications": [] }
    }"#;

    let backend = StubBackend::with_reply(reply);
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend, store);

    let session = session_with_transcript("s-2", consultation_transcript());
    let report = pipeline.generate(&session).await.unwrap();

    assert_eq!(report.session_id.as_deref(), Some("from-model"));
}

#[tokio::test]
async fn test_missing_treatment_plan_is_malformed_with_raw_preserved() {
    let reply = fenced(
        r#"{ "chiefComplaint": "fever", "diagnosis": { "primary": "Viral infection" } }"#,
    );
    let backend = StubBackend::with_reply(&reply);
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend, store);

    let session = session_with_transcript("s-3", consultation_transcript());
    let err = pipeline.generate(&session).await.unwrap_err();

    match err {
        SynthesisError::MalformedReport { reason, raw } => {
            assert!(reason.contains("treatmentPlan"), "unexpected reason: {}", reason);
            assert_eq!(raw, reply, "raw backend text must be preserved");
        }
        other => panic!("expected MalformedReport, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparsable_reply_is_malformed_with_raw_preserved() {
    let backend = StubBackend::with_reply("I'm sorry, I can't produce a report.");
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend, store);

    let session = session_with_transcript("s-4", consultation_transcript());
    let err = pipeline.generate(&session).await.unwrap_err();

    match err {
        SynthesisError::MalformedReport { raw, .. } => {
            assert!(raw.contains("I'm sorry"));
        }
        other => panic!("expected MalformedReport, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_reply_after_fence_strip() {
    let backend = StubBackend::with_reply("```json\n\n```");
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend, store);

    let session = session_with_transcript("s-5", consultation_transcript());
    let err = pipeline.generate(&session).await.unwrap_err();

    assert!(matches!(err, SynthesisError::EmptyBackendReply));
}

#[tokio::test]
async fn test_backend_unavailable_propagates() {
    let backend = StubBackend::unavailable();
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend, store);

    let session = session_with_transcript("s-6", consultation_transcript());
    let err = pipeline.generate(&session).await.unwrap_err();

    match err {
        SynthesisError::BackendUnavailable { status, message } => {
            assert_eq!(status, Some(503));
            assert!(message.contains("stub backend down"));
        }
        other => panic!("expected BackendUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_is_idempotent_for_identical_replies() {
    let backend = StubBackend::with_reply(&fenced(VALID_REPORT));
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend, store);

    let session = session_with_transcript("s-7", consultation_transcript());

    let first = pipeline.generate(&session).await.unwrap();
    let second = pipeline.generate(&session).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_persistence_failure_still_returns_report() {
    let backend = StubBackend::with_reply(&fenced(VALID_REPORT));
    let pipeline = ReportSynthesisPipeline::new(backend, Arc::new(FailingStore));

    let session = session_with_transcript("s-8", consultation_transcript());
    let report = pipeline.generate(&session).await.unwrap();

    assert_eq!(report.chief_complaint.as_deref(), Some("fever and cough"));
}

#[tokio::test]
async fn test_successful_generate_persists_report_and_transcript() {
    let backend = StubBackend::with_reply(&fenced(VALID_REPORT));
    let store = Arc::new(InMemorySessionStore::new());
    let pipeline = ReportSynthesisPipeline::new(backend, store.clone());

    let session_id = store
        .create(test_persona(), "3 days of fever and cough".to_string())
        .await
        .unwrap();

    let session = session_with_transcript(&session_id, consultation_transcript());
    pipeline.generate(&session).await.unwrap();

    let stored = store.get(&session_id).await.unwrap().unwrap();
    let report = stored.report.expect("report should be persisted");
    assert_eq!(report.chief_complaint.as_deref(), Some("fever and cough"));
    assert_eq!(report.session_id.as_deref(), Some(session_id.as_str()));
    assert_eq!(stored.transcript.len(), 2);
}

#[tokio::test]
async fn test_store_update_on_missing_session_is_not_found() {
    let store = InMemorySessionStore::new();

    let result = store
        .update("no-such-session", SessionPatch::default())
        .await;

    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_store_create_then_get_round_trips() {
    let store = InMemorySessionStore::new();

    let session_id = store
        .create(test_persona(), "mild rash on forearm".to_string())
        .await
        .unwrap();

    let session = store.get(&session_id).await.unwrap().unwrap();
    assert_eq!(session.persona.specialist, "General Physician");
    assert_eq!(session.intake_notes, "mild rash on forearm");
    assert!(session.transcript.is_empty());
    assert!(session.report.is_none());
}

// ============================================================================
// Persona suggestion
// ============================================================================

#[tokio::test]
async fn test_suggest_resolves_against_catalog() {
    let reply = fenced(
        r#"[{
            "specialist": "General Physician",
            "displayName": "Dr. Someone Else",
            "description": "irrelevant",
            "avatar": "/elsewhere.png"
        }]"#,
    );

    let backend = StubBackend::with_reply(&reply);
    let suggester = PersonaSuggester::new(backend);

    let personas = suggester.suggest("fever and cough").await.unwrap();

    assert_eq!(personas.len(), 1);
    // Canonical catalog entry wins over whatever the backend rendered
    assert_eq!(personas[0].display_name, "Dr. Emily Carter");
}

#[tokio::test]
async fn test_suggest_accepts_doctors_wrapper_and_drops_unknowns() {
    let reply = r#"{"doctors": [
        {
            "specialist": "Dermatologist",
            "displayName": "Dr. Aisha Rahman",
            "description": "skin",
            "avatar": "/avatars/dermatologist.png"
        },
        {
            "specialist": "Astrologer",
            "displayName": "Madame Zelda",
            "description": "stars",
            "avatar": "/zelda.png"
        }
    ]}"#;

    let backend = StubBackend::with_reply(reply);
    let suggester = PersonaSuggester::new(backend);

    let personas = suggester.suggest("itchy rash").await.unwrap();

    assert_eq!(personas.len(), 1);
    assert_eq!(personas[0].specialist, "Dermatologist");
}

#[tokio::test]
async fn test_suggest_malformed_reply_preserves_raw() {
    let backend = StubBackend::with_reply("not json at all");
    let suggester = PersonaSuggester::new(backend);

    let err = suggester.suggest("anything").await.unwrap_err();

    match err {
        SynthesisError::MalformedReport { raw, .. } => assert_eq!(raw, "not json at all"),
        other => panic!("expected MalformedReport, got {:?}", other),
    }
}
