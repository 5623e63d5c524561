use anyhow::anyhow;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::extractors::AuthedUser;
use crate::auth::jwt::issue_token;
use crate::auth::password::{hash_password, verify_password, verify_unknown_account};
use crate::auth::validation::{normalize_email, safe_email_log, validate_password};
use crate::billing::plans::{find_plan_by_name, FREE_PLAN};
use crate::billing::subscriptions::{effective_plan, subscribe, EffectivePlan};
use crate::billing::usage::{usage_for, UsageSummary};
use crate::errors::AppError;
use crate::models::user::{UserProfile, UserRow};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub plan: EffectivePlan,
    pub usage: UsageSummary,
}

fn auth_response(state: &AppState, user: &UserRow) -> Result<AuthResponse, AppError> {
    let ttl = state.config.jwt_ttl_hours;
    let token = issue_token(user.id, &user.email, &state.config.jwt_secret, ttl)
        .map_err(|e| AppError::Internal(anyhow!("could not issue token: {e}")))?;
    Ok(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: ttl * 3600,
        user: UserProfile::from(user),
    })
}

/// POST /auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email)?;
    validate_password(&req.password)?;
    let hashed_pw = hash_password(req.password).await?;

    let inserted = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (email, hashed_pw, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(&email)
    .bind(&hashed_pw)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await;

    let user = match inserted {
        Ok(user) => user,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!(email = %safe_email_log(&email), "Signup rejected: email already registered");
            return Err(AppError::Conflict("Email is already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let free = find_plan_by_name(&state.db, FREE_PLAN)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow!("the '{FREE_PLAN}' plan is missing")))?;
    subscribe(&state.db, user.id, &free, Utc::now()).await?;

    info!(user_id = user.id, email = %safe_email_log(&user.email), "User signed up");
    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let Some(user) = user else {
        verify_unknown_account(req.password).await?;
        warn!(email = %safe_email_log(&email), "Login failed: unknown email");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !verify_password(req.password, user.hashed_pw.clone()).await? {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    info!(user_id = user.id, "User logged in");
    Ok(Json(auth_response(&state, &user)?))
}

/// GET /auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthedUser,
) -> Result<Json<MeResponse>, AppError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(user.id)
        .fetch_one(&state.db)
        .await?;
    let now = Utc::now();
    let plan = effective_plan(&state.db, user.id, now).await?;
    let usage = usage_for(&state.db, user.id, now).await?;

    Ok(Json(MeResponse {
        user: UserProfile::from(&row),
        plan,
        usage,
    }))
}
