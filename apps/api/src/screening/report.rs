//! Shapes per-file screening outcomes for the API and the CLI.

use std::cmp::Ordering;
use std::fmt::Write;

use serde::Serialize;

use crate::screening::evaluator::{CandidateAssessment, Verdict};
use crate::screening::suspicious::SuspiciousFlag;

/// One-line verdict, e.g. `Jane Doe - 85% match - Strong Fit [green flag]`.
pub fn summary(assessment: &CandidateAssessment) -> String {
    let flag = match assessment.verdict {
        Verdict::StrongFit => "[green flag]",
        Verdict::WeakFit => "[red flag]",
    };
    format!(
        "{} - {}% match - {} {}",
        assessment.name, assessment.match_score, assessment.verdict, flag
    )
}

/// Green flags followed by red flags.
pub fn reasons(assessment: &CandidateAssessment) -> Vec<String> {
    assessment
        .green_flags
        .iter()
        .chain(assessment.red_flags.iter())
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedCandidate {
    pub name: String,
    pub match_score: u8,
    pub verdict: Verdict,
    pub summary: String,
    pub reasons: Vec<String>,
    pub green_flags: Vec<String>,
    pub red_flags: Vec<String>,
    pub interview_questions: Vec<String>,
}

impl From<CandidateAssessment> for EvaluatedCandidate {
    fn from(assessment: CandidateAssessment) -> Self {
        Self {
            summary: summary(&assessment),
            reasons: reasons(&assessment),
            name: assessment.name,
            match_score: assessment.match_score,
            verdict: assessment.verdict,
            green_flags: assessment.green_flags,
            red_flags: assessment.red_flags,
            interview_questions: assessment.interview_questions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Evaluated(EvaluatedCandidate),
    Failed { error: String },
}

/// Result for one uploaded file. Serialized flat, so a success carries
/// `summary`/`reasons`/... and a failure carries `error`.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningResult {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub suspicious_flags: Vec<String>,
}

impl ScreeningResult {
    pub fn evaluated(
        filename: impl Into<String>,
        assessment: CandidateAssessment,
        flags: &[SuspiciousFlag],
    ) -> Self {
        Self {
            filename: filename.into(),
            outcome: Outcome::Evaluated(assessment.into()),
            suspicious_flags: flag_messages(flags),
        }
    }

    pub fn failed(
        filename: impl Into<String>,
        error: impl Into<String>,
        flags: &[SuspiciousFlag],
    ) -> Self {
        Self {
            filename: filename.into(),
            outcome: Outcome::Failed {
                error: error.into(),
            },
            suspicious_flags: flag_messages(flags),
        }
    }

    pub fn candidate(&self) -> Option<&EvaluatedCandidate> {
        match &self.outcome {
            Outcome::Evaluated(c) => Some(c),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Evaluated(_) => None,
            Outcome::Failed { error } => Some(error),
        }
    }
}

fn flag_messages(flags: &[SuspiciousFlag]) -> Vec<String> {
    flags.iter().map(|f| f.message.clone()).collect()
}

/// Sorts by match score descending; failures keep their relative order at the end.
pub fn rank(results: &mut [ScreeningResult]) {
    results.sort_by(|a, b| match (a.candidate(), b.candidate()) {
        (Some(x), Some(y)) => y.match_score.cmp(&x.match_score),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Plain-text ranking of evaluated candidates, numbered from 1.
pub fn render_ranking(results: &[ScreeningResult]) -> String {
    let mut out = String::new();
    let evaluated = results
        .iter()
        .filter_map(|r| r.candidate().map(|c| (c, &r.suspicious_flags)));
    for (i, (candidate, flags)) in evaluated.enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, candidate.summary);
        for flag in flags {
            let _ = writeln!(out, "! {flag}");
        }
        for reason in &candidate.reasons {
            let _ = writeln!(out, "- {reason}");
        }
    }
    out
}
