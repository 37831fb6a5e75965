pub mod call;
pub mod config;
pub mod http;
pub mod report;
pub mod session;

pub use call::{
    CallError, CallEvent, CallSessionController, CallState, CallStatus, CallTransport,
    NatsCallTransport, StopOutcome, TranscriptKind, TransportError,
};
pub use config::{BackendConfig, Config};
pub use http::{create_router, AppState};
pub use report::{
    specialist_catalog, strip_code_fences, GenerationBackend, HttpGenerationBackend, Medication,
    PersonaSuggester, Report, ReportSynthesisPipeline, SynthesisError, TreatmentPlan,
};
pub use session::{
    InMemorySessionStore, Persona, Session, SessionPatch, SessionStore, Speaker, StoreError,
    TranscriptAggregator, Utterance,
};
