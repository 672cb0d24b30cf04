//! Inbound release webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use audiohook_common::Error;
use serde_json::json;

use super::error::AppError;
use super::signature::{verify_webhook_signature, SIGNATURE_HEADER};
use super::AppContext;
use crate::queue::{QueueJob, WebhookPayload};

pub fn webhook_routes() -> Router<AppContext> {
    Router::new().route("/", post(handle_webhook))
}

/// Accept a release announcement and queue it for metadata resolution.
///
/// Responds `202` with the job token as soon as the job is queued; all
/// provider work happens on the worker.
async fn handle_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if let Some(secret) = ctx.config.server.signature_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Unauthorized("missing signature header".into()))?;

        if !verify_webhook_signature(secret, &body, signature) {
            tracing::warn!("Invalid webhook signature");
            return Err(Error::Unauthorized("invalid signature".into()).into());
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| Error::validation(format!("invalid webhook body: {e}")))?;
    payload.validate()?;

    let token = ctx.queue.enqueue(QueueJob::new(payload))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "queued",
            "token": token,
        })),
    ))
}
