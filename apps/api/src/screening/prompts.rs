// Prompt constants for resume evaluation.

/// System prompt for evaluation. Combined with the shared JSON-only and
/// untrusted-input fragments from `llm_client::prompts`.
pub const EVALUATION_SYSTEM: &str = "You are a recruiter assistant who evaluates how well \
    a candidate's resume fits a job description.";

/// Evaluation prompt template. Replace `{job_description}` and `{resume_text}` before sending.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Given a job description and a candidate resume, evaluate how well the candidate fits.

Return a single JSON object with exactly these keys:
- "name": candidate's full name (string)
- "match_score": integer percentage match (0-100)
- "verdict": either "Strong Fit" or "Weak Fit"
- "green_flags": list of strings describing matching qualifications/skills
- "red_flags": list of strings describing missing requirements or issues
- "interview_questions": list of 3 to 5 interview questions tailored to this candidate's gaps and claims

Job Description:
{job_description}

Candidate Resume:
{resume_text}"#;
