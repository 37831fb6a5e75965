//! Transcript-to-report synthesis
//!
//! Turns a completed consultation transcript into a structured medical
//! report: deterministic prompt construction, a bounded chat-completions
//! call, tolerant extraction (fence stripping), strict validation, and
//! best-effort persistence. Also hosts the persona catalog and the
//! specialist-suggestion helper, which share the backend and the tolerant
//! parse path.

mod backend;
mod error;
mod pipeline;
mod prompt;
mod suggest;
mod types;

pub use backend::{GenerationBackend, HttpGenerationBackend};
pub use error::SynthesisError;
pub use pipeline::{strip_code_fences, ReportSynthesisPipeline};
pub use prompt::{render_transcript, render_user_payload, REPORT_SYSTEM_PROMPT};
pub use suggest::{specialist_catalog, PersonaSuggester};
pub use types::{
    Diagnosis, FollowUp, Medication, PatientEducation, PresentingHistory, Report, TreatmentPlan,
};
