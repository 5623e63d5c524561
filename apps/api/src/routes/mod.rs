pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::auth::handlers as auth;
use crate::billing::handlers as billing;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/auth/signup", post(auth::handle_signup))
        .route("/auth/login", post(auth::handle_login))
        .route("/auth/me", get(auth::handle_me))
        // Plans and usage
        .route("/plans", get(billing::handle_list_plans))
        .route("/subscriptions", post(billing::handle_subscribe))
        .route(
            "/subscriptions/current",
            get(billing::handle_current_subscription),
        )
        .route("/usage", get(billing::handle_usage))
        // Screening
        .route("/evaluate", post(screening::handle_evaluate))
        .route("/evaluate/", post(screening::handle_evaluate))
        .route("/evaluations", get(screening::handle_list_evaluations))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::billing::usage::reserve_run;
    use crate::testing::test_state;

    const BOUNDARY: &str = "screener-test-boundary";

    /// A text field is `(name, None, value)`; a file is `(name, Some(filename), contents)`.
    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Body {
        let mut body = String::new();
        for (name, filename, value) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(file) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    fn evaluate_request(uri: &str, token: Option<&str>, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(multipart_body(parts)).unwrap()
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn signup(app: &Router, email: &str) -> (String, i64) {
        let (status, body) = send(
            app,
            json_request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"email": email, "password": "hunter22hunter"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state().await);
        let (status, body) = send(&app, json_request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "screener-api");
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(json_request(Method::GET, "/", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&bytes);
        assert!(html.contains("<form"));
        assert!(html.contains("fetch(\"/plans\")"));
        assert!(html.contains("/subscriptions"));
    }

    #[tokio::test]
    async fn test_plans_are_public() {
        let app = build_router(test_state().await);
        let (status, body) = send(&app, json_request(Method::GET, "/plans", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[2]["name"], "business");
        assert_eq!(body[2]["max_runs"], Value::Null);
    }

    #[tokio::test]
    async fn test_signup_login_and_me() {
        let app = build_router(test_state().await);
        let (token, _) = signup(&app, "Jane@Example.com").await;

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"email": "jane@example.com", "password": "another-password"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let (status, wrong) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "jane@example.com", "password": "not-the-password"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (_, unknown) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "nobody@example.com", "password": "not-the-password"})),
            ),
        )
        .await;
        assert_eq!(wrong["error"]["message"], unknown["error"]["message"]);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "JANE@example.com", "password": "hunter22hunter"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");

        let (status, me) = send(&app, json_request(Method::GET, "/auth/me", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["user"]["email"], "jane@example.com");
        assert!(me["user"].get("hashed_pw").is_none());
        assert_eq!(me["plan"]["plan"]["name"], "free");
        assert_eq!(me["usage"]["used"], 0);
    }

    #[tokio::test]
    async fn test_signup_validates_input() {
        let app = build_router(test_state().await);
        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"email": "not-an-email", "password": "hunter22hunter"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({"email": "ok@example.com", "password": "short"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let app = build_router(test_state().await);
        for uri in ["/auth/me", "/usage", "/subscriptions/current", "/evaluations"] {
            let (status, body) = send(&app, json_request(Method::GET, uri, None, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
        let (status, _) = send(
            &app,
            json_request(Method::GET, "/usage", Some("garbage"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_subscription_flow() {
        let app = build_router(test_state().await);
        let (token, _) = signup(&app, "team@example.com").await;

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/subscriptions", Some(&token), Some(json!({"plan": "platinum"}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/subscriptions", Some(&token), Some(json!({"plan": "business"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plan"]["name"], "business");
        assert!(body["subscription"]["expires_at"].is_string());

        let (_, current) = send(
            &app,
            json_request(Method::GET, "/subscriptions/current", Some(&token), None),
        )
        .await;
        assert_eq!(current["plan"]["name"], "business");
        assert_eq!(current["expired"], false);

        let (_, usage) = send(&app, json_request(Method::GET, "/usage", Some(&token), None)).await;
        assert_eq!(usage["limit"], Value::Null);
    }

    #[tokio::test]
    async fn test_evaluate_ranks_and_reports_failures() {
        let app = build_router(test_state().await);
        let (token, _) = signup(&app, "hr@example.com").await;

        let (status, body) = send(
            &app,
            evaluate_request(
                "/evaluate?sort=score",
                Some(&token),
                &[
                    ("job_description", None, "Senior Rust engineer"),
                    ("resumes", Some("sam.txt"), "40\nSam"),
                    ("resumes", Some("cv.rtf"), "{\\rtf1 hi}"),
                    ("resumes", Some("jane.txt"), "90\nJane"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let results = body["results"].as_array().unwrap();
        let files: Vec<&str> = results.iter().map(|r| r["filename"].as_str().unwrap()).collect();
        assert_eq!(files, vec!["jane.txt", "sam.txt", "cv.rtf"]);
        assert_eq!(results[0]["verdict"], "Strong Fit");
        assert_eq!(results[1]["summary"], "Candidate 40 - 40% match - Weak Fit [red flag]");
        assert_eq!(results[2]["error"], "Could not extract text: Unsupported file type: .rtf");
        assert_eq!(body["usage"]["used"], 1);
        assert_eq!(body["usage"]["remaining"], 4);

        let (_, runs) = send(&app, json_request(Method::GET, "/evaluations", Some(&token), None)).await;
        assert_eq!(runs[0]["resume_count"], 3);
        assert_eq!(runs[0]["failed_count"], 1);
        assert_eq!(runs[0]["id"], body["run_id"]);
    }

    #[tokio::test]
    async fn test_evaluate_keeps_upload_order_with_advanced_fields() {
        let app = build_router(test_state().await);
        let (token, _) = signup(&app, "adv@example.com").await;

        let (status, body) = send(
            &app,
            evaluate_request(
                "/evaluate/",
                Some(&token),
                &[
                    ("title", None, "Backend Engineer"),
                    ("requirements", None, "Rust, Postgres"),
                    ("resumes[]", Some("a.txt"), "20\nA"),
                    ("resumes[]", Some("b.txt"), "80\nB"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let files: Vec<&str> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["filename"].as_str().unwrap())
            .collect();
        assert_eq!(files, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_bad_requests_without_charging() {
        let app = build_router(test_state().await);
        let (token, _) = signup(&app, "bad@example.com").await;

        let no_description = evaluate_request(
            "/evaluate",
            Some(&token),
            &[("resumes", Some("a.txt"), "50\nA")],
        );
        let (status, body) = send(&app, no_description).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let no_files = evaluate_request("/evaluate", Some(&token), &[("job_description", None, "jd")]);
        let (status, _) = send(&app, no_files).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let too_many = evaluate_request(
            "/evaluate",
            Some(&token),
            &[
                ("job_description", None, "jd"),
                ("resumes", Some("1.txt"), "1"),
                ("resumes", Some("2.txt"), "2"),
                ("resumes", Some("3.txt"), "3"),
                ("resumes", Some("4.txt"), "4"),
            ],
        );
        let (status, body) = send(&app, too_many).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("At most 3"));

        let bad_sort = evaluate_request(
            "/evaluate?sort=name",
            Some(&token),
            &[("job_description", None, "jd"), ("resumes", Some("a.txt"), "50")],
        );
        let (status, _) = send(&app, bad_sort).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, usage) = send(&app, json_request(Method::GET, "/usage", Some(&token), None)).await;
        assert_eq!(usage["used"], 0);
    }

    #[tokio::test]
    async fn test_evaluate_returns_results_when_run_bookkeeping_fails() {
        let state = test_state().await;
        let db = state.db.clone();
        let app = build_router(state);
        let (token, _) = signup(&app, "flaky@example.com").await;

        sqlx::query(
            "CREATE TRIGGER block_run_updates BEFORE UPDATE ON evaluation_runs \
             BEGIN SELECT RAISE(ABORT, 'bookkeeping unavailable'); END",
        )
        .execute(&db)
        .await
        .unwrap();

        let (status, body) = send(
            &app,
            evaluate_request(
                "/evaluate",
                Some(&token),
                &[("job_description", None, "jd"), ("resumes", Some("a.txt"), "75\nA")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["results"][0]["match_score"], 75);
        assert_eq!(body["usage"]["used"], 1);
    }

    #[tokio::test]
    async fn test_evaluate_refused_when_plan_exhausted() {
        let state = test_state().await;
        let db = state.db.clone();
        let app = build_router(state);
        let (token, user_id) = signup(&app, "limit@example.com").await;

        for _ in 0..5 {
            reserve_run(&db, user_id, 1, Utc::now()).await.unwrap();
        }

        let (status, body) = send(
            &app,
            evaluate_request(
                "/evaluate",
                Some(&token),
                &[("job_description", None, "jd"), ("resumes", Some("a.txt"), "50\nA")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["error"]["code"], "PLAN_LIMIT_REACHED");
    }

    #[tokio::test]
    async fn test_body_limit_enforced() {
        let app = build_router(test_state().await);
        let (token, _) = signup(&app, "big@example.com").await;
        let huge = "x".repeat(2 * 1024 * 1024);

        let response = app
            .clone()
            .oneshot(evaluate_request(
                "/evaluate",
                Some(&token),
                &[("job_description", None, "jd"), ("resumes", Some("big.txt"), huge.as_str())],
            ))
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::OK);
    }
}
