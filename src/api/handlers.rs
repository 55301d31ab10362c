use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::Update,
};

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Receives one pushed update.
///
/// The update is handled on a spawned task so Telegram gets its 200 without
/// waiting on catalog I/O or outbound replies.
pub async fn webhook(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<StatusCode> {
    let provided = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());
    if provided.is_none() || provided != state.webhook_secret.as_deref() {
        tracing::warn!(request_id = %request_id, "Webhook secret mismatch");
        return Err(AppError::Unauthorized("invalid webhook secret".to_string()));
    }

    let update: Update = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("malformed update: {}", e)))?;

    tracing::info!(
        request_id = %request_id,
        update_id = update.update_id,
        "Webhook update received"
    );

    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        let update_id = update.update_id;
        if let Err(e) = dispatcher.handle_update(update).await {
            tracing::error!(update_id, error = %e, "Failed to handle update");
        }
    });

    Ok(StatusCode::OK)
}
