//! Read-only API over processed jobs.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use audiohook_common::{Error, JobToken};
use serde_json::{json, Value};

use super::error::AppError;
use super::AppContext;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/jobs/:token", get(get_job))
        .route("/queue", get(queue_status))
}

async fn get_job(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let token = JobToken::parse(&token)
        .ok_or_else(|| Error::validation(format!("malformed job token '{token}'")))?;

    let record = ctx
        .store
        .get(token)
        .await
        .ok_or_else(|| Error::not_found("job", token))?;

    Ok(Json(json!({
        "token": token,
        "record": record,
    })))
}

async fn queue_status(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({
        "pending": ctx.queue.pending(),
        "capacity": ctx.queue.capacity(),
    }))
}
