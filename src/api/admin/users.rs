//! Staff account management (admin only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::CreateUserInput;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", delete(delete_user))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_service.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.user_service.create_user(&body).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// DELETE /api/admin/users/{id}
///
/// Deleting your own account is refused.
async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_user(actor.id, id).await?;
    tracing::info!(actor_id = actor.id, user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
