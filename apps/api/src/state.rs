use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::screening::evaluator::ResumeEvaluator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Model-backed in production, stubbed in tests.
    pub evaluator: Arc<dyn ResumeEvaluator>,
}
