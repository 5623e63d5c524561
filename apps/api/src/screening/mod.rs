//! Resume screening: job description input, per-file pipeline, suspicious
//! content detection, model evaluation and result shaping.

pub mod evaluator;
pub mod handlers;
pub mod job_description;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod suspicious;
