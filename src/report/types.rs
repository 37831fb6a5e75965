use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured consultation report synthesized from a completed transcript.
///
/// The backend is asked for this shape but is not trusted to produce it:
/// every group is optional at parse time and `validate()` enforces the
/// minimal required set afterwards. Unknown fields the model adds are
/// preserved through the flattened `extra` map, not stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Doctor name with specialty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chief_complaint: Option<String>,

    /// Symptom/history summary, used when no chief complaint is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenting_history: Option<PresentingHistory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_assessment: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_plan: Option<TreatmentPlan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle_guidance: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_plan: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_signs_to_watch: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_education: Option<PatientEducation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentingHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differential: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlan {
    #[serde(default)]
    pub medications: Vec<Medication>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_medication: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_recommendations: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One prescribed medication. Only the name is required per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,

    /// Specific intake times, e.g. "8:00 AM after breakfast, 8:00 PM after dinner"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_visit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrals: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEducation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_treatment_works: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_recovery: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevention: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    /// Minimal required-field check applied after parsing: something that
    /// identifies the complaint, an assessment, and a treatment section.
    /// Everything else may be absent without invalidating the report.
    pub fn validate(&self) -> Result<(), String> {
        let has_complaint = non_empty(&self.chief_complaint)
            || non_empty(&self.summary)
            || self
                .presenting_history
                .as_ref()
                .is_some_and(|h| non_empty(&h.symptoms));

        if !has_complaint {
            return Err("missing chiefComplaint or a symptoms summary".to_string());
        }

        if self.diagnosis.is_none() && self.clinical_assessment.is_none() {
            return Err("missing diagnosis or clinicalAssessment section".to_string());
        }

        if self.treatment_plan.is_none() {
            return Err("missing treatmentPlan section".to_string());
        }

        Ok(())
    }
}

fn non_empty(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}
