//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::test_pool;
use crate::screening::pipeline::tests::StubEvaluator;
use crate::state::AppState;

/// Inserts a bare user row and returns its id. The password hash is not usable.
pub async fn insert_user(pool: &SqlitePool, email: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (email, hashed_pw, created_at) VALUES (?, ?, ?) RETURNING id")
        .bind(email)
        .bind("unusable")
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .unwrap()
}

/// App state over a fresh in-memory database with the stub evaluator.
pub async fn test_state() -> AppState {
    AppState {
        db: test_pool().await,
        config: Config::for_tests(),
        evaluator: Arc::new(StubEvaluator::new()),
    }
}
