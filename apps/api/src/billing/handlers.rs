use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::extractors::AuthedUser;
use crate::billing::plans::{find_plan_by_name, list_plans};
use crate::billing::subscriptions::{effective_plan, subscribe, EffectivePlan};
use crate::billing::usage::{usage_for, UsageSummary};
use crate::errors::AppError;
use crate::models::plan::{SubscriptionPlanRow, UserSubscriptionRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub plan: String,
}

#[derive(Serialize)]
pub struct SubscriptionResponse {
    pub plan: SubscriptionPlanRow,
    pub subscription: UserSubscriptionRow,
}

/// GET /plans
pub async fn handle_list_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionPlanRow>>, AppError> {
    Ok(Json(list_plans(&state.db).await?))
}

/// POST /subscriptions
/// Switches plans immediately. No payment is taken.
pub async fn handle_subscribe(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let plan = find_plan_by_name(&state.db, &req.plan)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan '{}' not found", req.plan.trim())))?;

    let subscription = subscribe(&state.db, user.id, &plan, Utc::now()).await?;
    Ok(Json(SubscriptionResponse { plan, subscription }))
}

/// GET /subscriptions/current
pub async fn handle_current_subscription(
    State(state): State<AppState>,
    user: AuthedUser,
) -> Result<Json<EffectivePlan>, AppError> {
    Ok(Json(effective_plan(&state.db, user.id, Utc::now()).await?))
}

/// GET /usage
pub async fn handle_usage(
    State(state): State<AppState>,
    user: AuthedUser,
) -> Result<Json<UsageSummary>, AppError> {
    Ok(Json(usage_for(&state.db, user.id, Utc::now()).await?))
}
