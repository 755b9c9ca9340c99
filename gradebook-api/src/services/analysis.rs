//! AI analysis gateway
//!
//! Turns a child's grades into a structured analysis:
//! sanitize → build prompt → call the model (bounded by a timeout) → parse
//! into [`ParsedAnalysis`]. Output that does not match the report schema is
//! not an error; it becomes a degraded report carrying the raw text.

use gradebook_common::db::{Grade, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::llm::{CompletionRequest, LlmBackend, LlmError, Message};

/// Grades sent upstream per request
pub const MAX_GRADES: usize = 60;

/// Subject names are cut to this many characters
pub const MAX_SUBJECT_CHARS: usize = 64;

/// Grading scale upper bound
pub const GRADE_SCALE: f64 = 20.0;

const TEMPERATURE: f32 = 0.2;

/// Risk reason attached to degraded reports
pub const FALLBACK_REASON: &str = "Analysis output could not be parsed";

const SYSTEM_PROMPT: &str = r#"You are an educational assistant helping parents understand their child's school results.
Analyze the grades (scale /20) per subject, detect trends and risks, and give concrete advice.
Reply STRICTLY with compact, valid JSON matching this shape:
{
  "overview": { "summary": string, "highlights": string[] },
  "perSubject": [
    {
      "subject": string,
      "average": number,
      "trend": "rising" | "stable" | "falling",
      "strengths": string[],
      "weaknesses": string[],
      "actions": string[]
    }
  ],
  "globalTips": string[],
  "risk": { "level": "low" | "medium" | "high", "reasons": string[] }
}
Use an empty array for any empty section."#;

/// One caller-supplied grade, before sanitization
///
/// Fields are kept as raw JSON so that loosely typed input (numeric strings,
/// missing fields) reaches [`sanitize_grades`] instead of failing extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeInput {
    #[serde(default)]
    pub subject: Value,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub coef: Value,
    #[serde(default)]
    pub date: Value,
}

impl From<&Grade> for GradeInput {
    fn from(grade: &Grade) -> Self {
        Self {
            subject: Value::from(grade.subject.clone()),
            value: Value::from(grade.value),
            coef: grade.coef.map(Value::from).unwrap_or(Value::Null),
            date: grade.date.clone().map(Value::from).unwrap_or(Value::Null),
        }
    }
}

/// Child context included in the prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDescriptor {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
}

/// A grade as sent upstream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedGrade {
    pub subject: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coef: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Structured analysis returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub overview: Overview,
    #[serde(default)]
    pub per_subject: Vec<SubjectAnalysis>,
    #[serde(default)]
    pub global_tips: Vec<String>,
    pub risk: RiskAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAnalysis {
    pub subject: String,
    pub average: f64,
    pub trend: Trend,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Stable,
    Falling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Result of validating the model's text against [`AnalysisReport`]
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAnalysis {
    Valid(AnalysisReport),
    Malformed(String),
}

/// Terminal state of a completed call
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Succeeded(AnalysisReport),
    /// Model replied but not in the expected shape
    DegradedFallback(AnalysisReport),
}

impl AnalysisOutcome {
    pub fn report(&self) -> &AnalysisReport {
        match self {
            AnalysisOutcome::Succeeded(report) | AnalysisOutcome::DegradedFallback(report) => {
                report
            }
        }
    }

    pub fn into_report(self) -> AnalysisReport {
        match self {
            AnalysisOutcome::Succeeded(report) | AnalysisOutcome::DegradedFallback(report) => {
                report
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::DegradedFallback(_))
    }
}

/// Outcome plus the model the provider says produced it
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAnalysis {
    pub outcome: AnalysisOutcome,
    pub model: String,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Nothing left to analyze after sanitization
    #[error("No grades provided")]
    NoGrades,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Model backend error: {0}")]
    Backend(#[from] LlmError),
}

/// Read a finite number from a JSON number or numeric string
fn finite_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn subject_text(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    text.chars().take(MAX_SUBJECT_CHARS).collect()
}

/// Bound and normalize caller-supplied grades
///
/// Keeps the first [`MAX_GRADES`] entries in input order, drops entries
/// without a usable numeric value, clamps values into `[0, 20]`, cuts subjects
/// to [`MAX_SUBJECT_CHARS`] characters, and keeps coefficient and date only
/// when well formed.
pub fn sanitize_grades(grades: &[GradeInput]) -> Vec<SanitizedGrade> {
    grades
        .iter()
        .take(MAX_GRADES)
        .filter_map(|grade| {
            let value = finite_number(&grade.value)?;
            Some(SanitizedGrade {
                subject: subject_text(&grade.subject),
                value: value.clamp(0.0, GRADE_SCALE),
                coef: finite_number(&grade.coef).filter(|c| *c >= 0.0),
                date: grade
                    .date
                    .as_str()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Build the completion request for sanitized grades
pub fn build_request(child: &ChildDescriptor, grades: &[SanitizedGrade]) -> CompletionRequest {
    let payload = json!({
        "child": {
            "firstName": child.first_name,
            "gradeLevel": child.grade_level,
        },
        "grades": grades,
        "rules": {
            "scale": 20,
            "considerDate": true,
        },
    });

    CompletionRequest::new(vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(payload.to_string()),
    ])
    .with_temperature(TEMPERATURE)
    .with_json_output()
}

/// Validate model output against the report schema
pub fn parse_analysis(raw: &str) -> ParsedAnalysis {
    match serde_json::from_str::<AnalysisReport>(raw) {
        Ok(report) => ParsedAnalysis::Valid(report),
        Err(e) => {
            debug!("Model output does not match report schema: {}", e);
            ParsedAnalysis::Malformed(raw.to_string())
        }
    }
}

/// Degraded report wrapping unparseable model output
pub fn fallback_report(raw: &str) -> AnalysisReport {
    AnalysisReport {
        overview: Overview {
            summary: raw.to_string(),
            highlights: Vec::new(),
        },
        per_subject: Vec::new(),
        global_tips: Vec::new(),
        risk: RiskAssessment {
            level: RiskLevel::Medium,
            reasons: vec![FALLBACK_REASON.to_string()],
        },
    }
}

/// Analysis gateway bound to one backend
pub struct AnalysisGateway {
    backend: Arc<dyn LlmBackend>,
    timeout: Duration,
}

impl AnalysisGateway {
    pub fn new(backend: Arc<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Model identifier reported alongside each analysis
    pub fn model(&self) -> &str {
        self.backend.id()
    }

    /// Run one analysis
    ///
    /// No upstream call is made when sanitization leaves no grades. The whole
    /// backend call is bounded by the configured timeout; there are no retries.
    pub async fn analyze(
        &self,
        child: &ChildDescriptor,
        grades: &[GradeInput],
    ) -> Result<CompletedAnalysis, AnalysisError> {
        let sanitized = sanitize_grades(grades);
        if sanitized.is_empty() {
            return Err(AnalysisError::NoGrades);
        }

        let request = build_request(child, &sanitized);
        debug!(
            "Requesting analysis of {} grades from {}",
            sanitized.len(),
            self.model()
        );

        let response = match tokio::time::timeout(self.timeout, self.backend.complete(request)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(AnalysisError::Timeout(self.timeout)),
        };

        let raw = response.content.trim();
        if raw.is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        let outcome = match parse_analysis(raw) {
            ParsedAnalysis::Valid(report) => {
                info!(
                    "Analysis completed ({} subjects, risk {})",
                    report.per_subject.len(),
                    report.risk.level
                );
                AnalysisOutcome::Succeeded(report)
            }
            ParsedAnalysis::Malformed(raw) => {
                warn!("Model output was not valid analysis JSON; returning fallback");
                AnalysisOutcome::DegradedFallback(fallback_report(&raw))
            }
        };

        Ok(CompletedAnalysis {
            outcome,
            model: response.model,
        })
    }
}
