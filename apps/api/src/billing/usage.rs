//! Per-plan usage accounting over a rolling window.
//!
//! A run is reserved with a single conditional INSERT, so concurrent requests
//! from the same user cannot both slip under the limit.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::subscriptions::effective_plan;
use crate::errors::AppError;
use crate::models::evaluation::EvaluationRunRow;

pub const USAGE_WINDOW_DAYS: i64 = 30;
const MAX_HISTORY: i64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub plan: String,
    pub used: i64,
    /// `None` means unlimited.
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
    pub window_days: i64,
}

impl UsageSummary {
    pub fn new(plan: impl Into<String>, used: i64, limit: Option<i64>) -> Self {
        Self {
            plan: plan.into(),
            used,
            limit,
            remaining: limit.map(|l| (l - used).max(0)),
            window_days: USAGE_WINDOW_DAYS,
        }
    }

    fn limit_message(&self) -> String {
        format!(
            "The '{}' plan allows {} evaluation runs per {} days and {} have been used. \
             Upgrade your plan to continue.",
            self.plan,
            self.limit.unwrap_or_default(),
            self.window_days,
            self.used
        )
    }
}

fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(USAGE_WINDOW_DAYS)
}

pub async fn count_runs_since(
    pool: &SqlitePool,
    user_id: i64,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM evaluation_runs WHERE user_id = ? AND created_at >= ?")
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await
}

pub async fn usage_for(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<UsageSummary, AppError> {
    let effective = effective_plan(pool, user_id, now).await?;
    let used = count_runs_since(pool, user_id, window_start(now)).await?;
    Ok(UsageSummary::new(effective.plan.name, used, effective.plan.max_runs))
}

/// Reserves one run against the user's plan, or fails with `PlanLimitReached`.
pub async fn reserve_run(
    pool: &SqlitePool,
    user_id: i64,
    resume_count: usize,
    now: DateTime<Utc>,
) -> Result<EvaluationRunRow, AppError> {
    let effective = effective_plan(pool, user_id, now).await?;
    let limit = effective.plan.max_runs;
    let run_id = Uuid::new_v4().to_string();

    let inserted = sqlx::query_as::<_, EvaluationRunRow>(
        r#"
        INSERT INTO evaluation_runs (id, user_id, resume_count, failed_count, created_at)
        SELECT ?1, ?2, ?3, 0, ?4
        WHERE ?5 IS NULL
           OR (SELECT COUNT(*) FROM evaluation_runs WHERE user_id = ?2 AND created_at >= ?6) < ?5
        RETURNING *
        "#,
    )
    .bind(&run_id)
    .bind(user_id)
    .bind(resume_count as i64)
    .bind(now)
    .bind(limit)
    .bind(window_start(now))
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(run) => {
            info!("Reserved evaluation run {run_id} for user {user_id}");
            Ok(run)
        }
        None => {
            let usage = usage_for(pool, user_id, now).await?;
            warn!(
                "User {user_id} reached the '{}' plan limit ({} runs)",
                usage.plan, usage.used
            );
            Err(AppError::PlanLimitReached(usage.limit_message()))
        }
    }
}

/// Records how many files in a reserved run failed.
pub async fn complete_run(
    pool: &SqlitePool,
    run_id: &str,
    failed_count: usize,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE evaluation_runs SET failed_count = ? WHERE id = ?")
        .bind(failed_count as i64)
        .bind(run_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// The user's most recent runs, newest first.
pub async fn recent_runs(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<EvaluationRunRow>, sqlx::Error> {
    sqlx::query_as::<_, EvaluationRunRow>(
        "SELECT * FROM evaluation_runs WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(MAX_HISTORY)
    .fetch_all(pool)
    .await
}
