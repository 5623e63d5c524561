//! Resume evaluation: pluggable, trait-based evaluator that scores one resume
//! against a job description.
//!
//! Default: `LlmResumeEvaluator`. `AppState` holds an `Arc<dyn ResumeEvaluator>`
//! so handlers and tests never depend on the model provider.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, UNTRUSTED_INPUT_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::screening::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};

/// Scores at or above this are a strong fit when the model's verdict is unusable.
pub const STRONG_FIT_THRESHOLD: u8 = 70;
const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Strong Fit")]
    StrongFit,
    #[serde(rename = "Weak Fit")]
    WeakFit,
}

impl Verdict {
    /// Lenient parse: accepts "Strong Fit", "strong_fit", "STRONG", etc.
    pub fn parse(raw: &str) -> Option<Self> {
        let letters: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();
        match letters.as_str() {
            "strongfit" | "strong" => Some(Verdict::StrongFit),
            "weakfit" | "weak" => Some(Verdict::WeakFit),
            _ => None,
        }
    }

    pub fn from_score(score: u8) -> Self {
        if score >= STRONG_FIT_THRESHOLD {
            Verdict::StrongFit
        } else {
            Verdict::WeakFit
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::StrongFit => f.write_str("Strong Fit"),
            Verdict::WeakFit => f.write_str("Weak Fit"),
        }
    }
}

/// Normalised evaluation of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAssessment {
    pub name: String,
    pub match_score: u8,
    pub verdict: Verdict,
    pub green_flags: Vec<String>,
    pub red_flags: Vec<String>,
    pub interview_questions: Vec<String>,
}

/// The model's reply as sent. Every field is optional so that partial replies
/// still produce a usable assessment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawAssessment {
    pub name: Option<String>,
    pub match_score: Option<Value>,
    pub verdict: Option<String>,
    pub green_flags: Vec<Value>,
    pub red_flags: Vec<Value>,
    pub interview_questions: Vec<Value>,
}

impl From<RawAssessment> for CandidateAssessment {
    fn from(raw: RawAssessment) -> Self {
        let match_score = raw.match_score.as_ref().and_then(parse_score).unwrap_or(0);
        let verdict = raw
            .verdict
            .as_deref()
            .and_then(Verdict::parse)
            .unwrap_or_else(|| Verdict::from_score(match_score));
        let name = raw
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string());

        CandidateAssessment {
            name,
            match_score,
            verdict,
            green_flags: text_items(raw.green_flags),
            red_flags: text_items(raw.red_flags),
            interview_questions: text_items(raw.interview_questions),
        }
    }
}

/// Accepts `85`, `85.4`, `"85"` or `"85%"`; clamps to 0–100.
fn parse_score(value: &Value) -> Option<u8> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !score.is_finite() {
        return None;
    }
    Some(score.round().clamp(0.0, 100.0) as u8)
}

fn text_items(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Truncates to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the user prompt for one resume.
pub fn build_prompt(job_description: &str, resume_text: &str) -> String {
    EVALUATION_PROMPT_TEMPLATE
        .replace("{job_description}", job_description.trim())
        .replace("{resume_text}", resume_text.trim())
}

/// The evaluator trait. Implement this to swap backends without touching
/// the endpoint, handler, or CLI code.
#[async_trait]
pub trait ResumeEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<CandidateAssessment, AppError>;
}

/// Evaluator backed by the chat-completions model.
pub struct LlmResumeEvaluator {
    llm: LlmClient,
    max_resume_chars: usize,
    system: String,
}

impl LlmResumeEvaluator {
    pub fn new(llm: LlmClient, max_resume_chars: usize) -> Self {
        Self {
            llm,
            max_resume_chars,
            system: format!("{EVALUATION_SYSTEM} {UNTRUSTED_INPUT_INSTRUCTION} {JSON_ONLY_SYSTEM}"),
        }
    }
}

#[async_trait]
impl ResumeEvaluator for LlmResumeEvaluator {
    async fn evaluate(
        &self,
        job_description: &str,
        resume_text: &str,
    ) -> Result<CandidateAssessment, AppError> {
        let resume_text = truncate_chars(resume_text, self.max_resume_chars);
        let prompt = build_prompt(job_description, resume_text);

        let raw: RawAssessment = self
            .llm
            .call_json(&prompt, &self.system)
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;
        let assessment = CandidateAssessment::from(raw);

        debug!(
            model = %self.llm.model(),
            score = assessment.match_score,
            verdict = %assessment.verdict,
            "Resume evaluated"
        );
        Ok(assessment)
    }
}
