use axum::extract::rejection::JsonRejection;
use axum::{extract::State, response::IntoResponse, Json};

use crate::error::AppError;
use crate::models::auth::{AuthRequest, AuthResponse};
use crate::AppState;

/// POST /api/auth — check the submitted master key.
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    tracing::info!(
        handler = "authenticate",
        key_present = body.master_key.as_deref().is_some_and(|k| !k.is_empty()),
        "Handler: POST /api/auth"
    );

    state.gate.authenticate(body.master_key.as_deref())?;

    tracing::info!(handler = "authenticate", status = 200, "Responding: authenticated");

    Ok(Json(AuthResponse {
        success: true,
        message: "Authentication successful".into(),
    }))
}
