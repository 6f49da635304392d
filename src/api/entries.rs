use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::client::ClientAddr;
use super::session::resolve;
use super::{ApiError, ApiResponse, AppState, EntryDto};
use crate::auth::{Privilege, view_level};

/// GET /api/entries
///
/// Visitors without a session see the board at the configured default
/// level; teacher columns are hidden below full view.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    session: Session,
    client: ClientAddr,
) -> Result<Json<ApiResponse<Vec<EntryDto>>>, ApiError> {
    let caller = resolve(&state, &session, client).await?;
    let default_level = state.config().read().await.board.default_privilege;

    let level = view_level(&caller.principal, default_level);
    if level == Privilege::None {
        return Err(ApiError::forbidden("board not visible"));
    }

    let entries = state
        .shared
        .entries
        .list()
        .await?
        .into_iter()
        .map(|e| EntryDto::for_viewer(e, level))
        .collect();

    Ok(Json(ApiResponse::success(entries)))
}
