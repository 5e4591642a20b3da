use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::models::secret::{CreateResponse, DeleteQuery, DeleteResponse, ListResponse, NewSecret};
use crate::repository::RemoveOutcome;
use crate::AppState;

/// GET /api/secrets
pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!(handler = "list_secrets", "Handler: GET /api/secrets");

    tracing::debug!(handler = "list_secrets", "Dispatching to repo.list");
    match state.repo.list().await {
        Ok(secrets) => {
            tracing::info!(
                handler = "list_secrets",
                returned = secrets.len(),
                status = 200,
                "Responding: secrets listed"
            );
            (StatusCode::OK, Json(ListResponse { secrets }))
        }
        Err(e) => {
            tracing::error!(handler = "list_secrets", error = %e, "Responding with 500");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ListResponse { secrets: Vec::new() }),
            )
        }
    }
}

/// POST /api/secrets
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewSecret>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    tracing::info!(handler = "create_secret", "Handler: POST /api/secrets");

    if let Err(msg) = body.validate() {
        tracing::warn!(handler = "create_secret", "Validation failed: missing fields");
        return Err(AppError::BadRequest(msg));
    }

    tracing::debug!(handler = "create_secret", "Dispatching to repo.append");
    let secret = state.repo.append(body).await?;
    tracing::debug!(handler = "create_secret", id = %secret.id, "Repo returned: secret stored");

    tracing::info!(
        handler = "create_secret",
        id = %secret.id,
        status = 200,
        "Responding: secret added"
    );

    Ok(Json(CreateResponse {
        success: true,
        message: "Secret added successfully".into(),
        secret,
    }))
}

/// DELETE /api/secrets?id=<id>
pub async fn delete(
    State(state): State<AppState>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    tracing::info!(
        handler = "delete_secret",
        id = params.id.as_deref().unwrap_or(""),
        "Handler: DELETE /api/secrets"
    );

    let id = match params.id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(AppError::BadRequest("Secret ID is required".into())),
    };

    tracing::debug!(handler = "delete_secret", "Dispatching to repo.remove_by_id");
    let outcome = state.repo.remove_by_id(&id).await?;
    tracing::debug!(handler = "delete_secret", ?outcome, "Repo returned");

    if outcome == RemoveOutcome::StoreMissing {
        return Err(AppError::NotFound("No secrets found".into()));
    }

    tracing::info!(
        handler = "delete_secret",
        id = %id,
        removed = (outcome == RemoveOutcome::Removed),
        status = 200,
        "Responding: secret deleted"
    );

    Ok(Json(DeleteResponse {
        success: true,
        message: "Secret deleted successfully".into(),
    }))
}
