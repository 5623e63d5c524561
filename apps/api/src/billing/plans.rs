use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::plan::SubscriptionPlanRow;

/// Plan every account falls back to.
pub const FREE_PLAN: &str = "free";

struct PlanSeed {
    name: &'static str,
    description: &'static str,
    price_usd: f64,
    max_runs: Option<i64>,
}

const DEFAULT_PLANS: &[PlanSeed] = &[
    PlanSeed {
        name: FREE_PLAN,
        description: "Free, no signup required",
        price_usd: 0.0,
        max_runs: Some(5),
    },
    PlanSeed {
        name: "personal",
        description: "Job seeker pro features",
        price_usd: 9.99,
        max_runs: Some(100),
    },
    PlanSeed {
        name: "business",
        description: "HR team suite",
        price_usd: 49.99,
        max_runs: None,
    },
];

/// Inserts the default catalogue when the plans table is empty.
/// Returns the number of plans inserted.
pub async fn seed_default_plans(pool: &SqlitePool) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscription_plans")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for plan in DEFAULT_PLANS {
        sqlx::query(
            "INSERT INTO subscription_plans (name, description, price_usd, max_runs) VALUES (?, ?, ?, ?)",
        )
        .bind(plan.name)
        .bind(plan.description)
        .bind(plan.price_usd)
        .bind(plan.max_runs)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(DEFAULT_PLANS.len() as u64)
}

pub async fn list_plans(pool: &SqlitePool) -> Result<Vec<SubscriptionPlanRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlanRow>(
        "SELECT * FROM subscription_plans ORDER BY price_usd, id",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_plan_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<SubscriptionPlanRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlanRow>(
        "SELECT * FROM subscription_plans WHERE name = ?",
    )
    .bind(name.trim().to_lowercase())
    .fetch_optional(pool)
    .await
}
