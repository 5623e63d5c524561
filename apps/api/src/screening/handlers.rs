use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::auth::extractors::AuthedUser;
use crate::billing::usage::{complete_run, recent_runs, reserve_run, usage_for, UsageSummary};
use crate::errors::AppError;
use crate::models::evaluation::EvaluationRunRow;
use crate::screening::job_description::{resolve_job_description, AdvancedJobDetails};
use crate::screening::pipeline::{screen_batch, Upload};
use crate::screening::report::{rank, ScreeningResult};
use crate::state::AppState;

const RESUME_FIELDS: [&str; 3] = ["resumes", "resumes[]", "resume"];

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateQuery {
    /// `score` ranks results; otherwise upload order is kept.
    pub sort: Option<String>,
}

#[derive(Serialize)]
pub struct EvaluateResponse {
    pub run_id: String,
    pub results: Vec<ScreeningResult>,
    pub usage: UsageSummary,
}

/// Everything a multipart evaluation request carries.
#[derive(Debug, Default)]
struct EvaluationForm {
    job_description: Option<String>,
    advanced: AdvancedJobDetails,
    uploads: Vec<Upload>,
}

fn malformed(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {e}"))
}

async fn read_form(multipart: &mut Multipart, max_files: usize) -> Result<EvaluationForm, AppError> {
    let mut form = EvaluationForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        if RESUME_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(malformed)?;
            // Browsers send an empty part for an untouched file input.
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }
            if form.uploads.len() == max_files {
                return Err(AppError::Validation(format!(
                    "At most {max_files} resumes can be evaluated per request"
                )));
            }
            let filename = if filename.is_empty() { "resume".to_string() } else { filename };
            form.uploads.push(Upload::new(filename, bytes));
            continue;
        }

        let value = field.text().await.map_err(malformed)?;
        if name == "job_description" {
            form.job_description = Some(value);
        } else if !form.advanced.set_field(&name, value) {
            debug!(field = %name, "Ignoring unknown form field");
        }
    }

    Ok(form)
}

/// POST /evaluate
///
/// Multipart form: `job_description` (or the advanced job fields) plus one or
/// more `resumes` files. One evaluation run is charged per request.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(query): Query<EvaluateQuery>,
    mut multipart: Multipart,
) -> Result<Json<EvaluateResponse>, AppError> {
    let sort_by_score = match query.sort.as_deref() {
        None => false,
        Some("score") => true,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "Unsupported sort '{other}'; only 'score' is available"
            )))
        }
    };

    let form = read_form(&mut multipart, state.config.max_resumes_per_request).await?;
    let job_description =
        resolve_job_description(form.job_description.as_deref(), &form.advanced)?;
    if form.uploads.is_empty() {
        return Err(AppError::Validation(
            "Please upload at least one resume".to_string(),
        ));
    }

    let run = reserve_run(&state.db, user.id, form.uploads.len(), Utc::now()).await?;
    info!(
        run_id = %run.id,
        user_id = user.id,
        files = form.uploads.len(),
        "Evaluating resumes"
    );

    let mut results = screen_batch(
        state.evaluator.as_ref(),
        &job_description,
        form.uploads,
        state.config.evaluation_concurrency,
    )
    .await;

    let failed = results.iter().filter(|r| r.error().is_some()).count();
    // The run is already charged; losing the failure count must not lose the results.
    if let Err(e) = complete_run(&state.db, &run.id, failed).await {
        error!(run_id = %run.id, "Could not record evaluation run outcome: {e}");
    }
    info!(run_id = %run.id, failed, "Evaluation run finished");

    if sort_by_score {
        rank(&mut results);
    }
    let usage = usage_for(&state.db, user.id, Utc::now()).await?;

    Ok(Json(EvaluateResponse {
        run_id: run.id,
        results,
        usage,
    }))
}

/// GET /evaluations
pub async fn handle_list_evaluations(
    State(state): State<AppState>,
    user: AuthedUser,
) -> Result<Json<Vec<EvaluationRunRow>>, AppError> {
    Ok(Json(recent_runs(&state.db, user.id).await?))
}
