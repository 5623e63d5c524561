use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::billing::plans::{find_plan_by_name, FREE_PLAN};
use crate::errors::AppError;
use crate::models::plan::{SubscriptionPlanRow, UserSubscriptionRow};

pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// The plan that currently governs a user, plus the subscription it came from.
#[derive(Debug, Clone, Serialize)]
pub struct EffectivePlan {
    pub plan: SubscriptionPlanRow,
    pub subscription: Option<UserSubscriptionRow>,
    /// True when a subscription exists but has lapsed, so `plan` is the free fallback.
    pub expired: bool,
}

/// Paid plans run for one period; free never expires.
pub fn expiry_for(plan: &SubscriptionPlanRow, starts_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if plan.price_usd > 0.0 {
        Some(starts_at + Duration::days(SUBSCRIPTION_PERIOD_DAYS))
    } else {
        None
    }
}

pub fn is_active(subscription: &UserSubscriptionRow, now: DateTime<Utc>) -> bool {
    subscription.expires_at.map_or(true, |expires| expires > now)
}

/// Replaces the user's subscription with `plan`, starting now.
pub async fn subscribe(
    pool: &SqlitePool,
    user_id: i64,
    plan: &SubscriptionPlanRow,
    now: DateTime<Utc>,
) -> Result<UserSubscriptionRow, sqlx::Error> {
    let expires_at = expiry_for(plan, now);

    let row = sqlx::query_as::<_, UserSubscriptionRow>(
        r#"
        INSERT INTO user_subscriptions (user_id, plan_id, starts_at, expires_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            plan_id = excluded.plan_id,
            starts_at = excluded.starts_at,
            expires_at = excluded.expires_at
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(plan.id)
    .bind(now)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    info!("User {user_id} subscribed to plan '{}'", plan.name);
    Ok(row)
}

pub async fn current_subscription(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<UserSubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, UserSubscriptionRow>("SELECT * FROM user_subscriptions WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Resolves the plan in force at `now`; missing or lapsed subscriptions fall back to free.
pub async fn effective_plan(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<EffectivePlan, AppError> {
    let subscription = current_subscription(pool, user_id).await?;

    if let Some(sub) = subscription.as_ref().filter(|s| is_active(s, now)) {
        let plan = sqlx::query_as::<_, SubscriptionPlanRow>(
            "SELECT * FROM subscription_plans WHERE id = ?",
        )
        .bind(sub.plan_id)
        .fetch_optional(pool)
        .await?;
        if let Some(plan) = plan {
            return Ok(EffectivePlan {
                plan,
                subscription,
                expired: false,
            });
        }
    }

    let free = find_plan_by_name(pool, FREE_PLAN)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow!("the '{FREE_PLAN}' plan is missing")))?;
    let expired = subscription.is_some();

    Ok(EffectivePlan {
        plan: free,
        subscription,
        expired,
    })
}
