use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::client::ClientAddr;
use super::session::resolve;
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::auth::{Privilege, Requirement, permits};

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    session: Session,
    client: ClientAddr,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let caller = resolve(&state, &session, client).await?;
    if !permits(&caller.principal, Requirement::AtLeast(Privilege::Admin)) {
        return Err(ApiError::forbidden("user list"));
    }

    let users = state
        .shared
        .credentials
        .list()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .into_iter()
        .map(|u| UserDto {
            logged_in: u.has_session(),
            id: u.id.value(),
            name: u.name,
            privilege: u.privilege,
        })
        .collect();

    Ok(Json(ApiResponse::success(users)))
}
