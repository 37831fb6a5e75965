use crate::session::{Session, Speaker, Utterance};

/// Fixed instruction template describing the report schema expected back
/// from the generation backend. The reply must be a single JSON object.
pub const REPORT_SYSTEM_PROMPT: &str = r#"You are a medical documentation expert. Create a DETAILED, COMPREHENSIVE medical consultation report.

Generate a JSON report with these sections. Be thorough and specific:

{
  "sessionId": "session ID",
  "agent": "Doctor name with specialty",
  "user": "Patient name or 'Patient'",
  "timestamp": "ISO date/time",
  "chiefComplaint": "2-3 sentence description of the main issue",
  "summary": "Comprehensive summary of the consultation",
  "presentingHistory": {
    "symptoms": "Detailed paragraph describing all symptoms, onset, duration, severity, progression",
    "timeline": "When symptoms started and how they've changed",
    "impact": "How symptoms affect daily life, work, sleep, mood"
  },
  "diagnosis": {
    "primary": "Main diagnosis with medical explanation",
    "differential": ["Other possible conditions considered"],
    "reasoning": "Paragraph explaining why this diagnosis and the key findings supporting it"
  },
  "treatmentPlan": {
    "medications": [
      {
        "name": "Full medication name",
        "dosage": "Exact amount (500mg, 10ml, etc.)",
        "frequency": "How often (twice daily, every 8 hours, etc.)",
        "timing": "SPECIFIC times - e.g. '8:00 AM after breakfast, 8:00 PM after dinner'",
        "duration": "Complete course (7 days, 2 weeks, as needed)",
        "instructions": "Take with food/water, avoid alcohol, complete full course, etc."
      }
    ],
    "nonMedication": ["Physical therapy, exercises, home remedies with instructions"]
  },
  "lifestyleGuidance": {
    "diet": { "recommendations": ["Specific foods with quantities/timing"], "restrictions": ["Foods to avoid and why"] },
    "activity": { "exercise": "Recommendations with duration/frequency", "rest": "Sleep and rest requirements" }
  },
  "followUp": {
    "nextVisit": "When to schedule follow-up and why",
    "tests": ["Lab tests or imaging needed with timing"],
    "referrals": ["Specialist referrals if needed"],
    "reviewDate": "When to review progress"
  },
  "warningSignsToWatch": ["Symptoms requiring immediate medical attention - be specific"],
  "patientEducation": {
    "aboutCondition": "Explanation of the condition in simple terms",
    "howTreatmentWorks": "Why this treatment approach",
    "expectedRecovery": "Timeline for improvement, what to expect",
    "prevention": ["How to prevent recurrence or complications"]
  },
  "additionalNotes": "Any other important information or observations",
  "disclaimer": "Standard medical disclaimer"
}

CRITICAL REQUIREMENTS:
1. For MEDICATIONS: always specify EXACT timing like "8:00 AM, 2:00 PM, 8:00 PM"
2. Write in complete paragraphs for history, reasoning and education sections
3. Be specific with dosages, quantities and timeframes
4. Extract EVERY detail from the conversation
5. Use medical terminology appropriately

Analyze the conversation and create this detailed report. Return ONLY the JSON."#;

/// Speaker label used in the rendered conversation
fn speaker_label(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::Assistant => "Doctor",
        Speaker::Patient => "Patient",
    }
}

/// Render the finalized transcript as "Doctor:"/"Patient:" lines.
pub fn render_transcript(transcript: &[Utterance]) -> String {
    transcript
        .iter()
        .map(|u| format!("{}: {}", speaker_label(u.speaker), u.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the user payload for report synthesis: persona, session context
/// and the full conversation. Deterministic for a given session - the
/// timestamp comes from the session record, never from the clock.
pub fn render_user_payload(session: &Session) -> String {
    format!(
        "Doctor Specialist: {}\nDate: {}\nSession: {}\nPatient Notes: {}\n\nCONVERSATION:\n{}\n\nCreate a detailed medical report based on this consultation. Include every detail discussed, exact medication timings, and comprehensive explanations.",
        session.persona.specialist,
        session.created_at.to_rfc3339(),
        session.id,
        session.intake_notes,
        render_transcript(&session.transcript),
    )
}
