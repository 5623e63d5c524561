use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationRunRow {
    pub id: String,
    pub user_id: i64,
    pub resume_count: i64,
    pub failed_count: i64,
    pub created_at: DateTime<Utc>,
}
