//! Ties the cookie session to the token the binder checks.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::client::ClientAddr;
use super::{ApiError, ApiResponse, AppState};
use crate::auth::{Principal, Privilege, RequestContext};

/// Session key holding the opaque token.
pub const TOKEN_KEY: &str = "token";

/// Identity and transport facts of the current request.
pub struct Caller {
    pub principal: Principal,
    pub ctx: RequestContext,
}

pub async fn stored_token(session: &Session) -> String {
    match session.get::<String>(TOKEN_KEY).await {
        Ok(token) => token.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            String::new()
        }
    }
}

pub async fn resolve(
    state: &AppState,
    session: &Session,
    ClientAddr(address): ClientAddr,
) -> Result<Caller, ApiError> {
    let ctx = RequestContext::new(stored_token(session).await, address);
    let principal = state.dispatcher().binder().bind(&ctx).await?;

    if let Some(user_id) = principal.user_id() {
        tracing::Span::current().record("user_id", user_id.value());
    }

    Ok(Caller { principal, ctx })
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub user_id: Option<i32>,
    pub name: Option<String>,
    pub privilege: Privilege,
}

/// GET /api/session
pub async fn current(
    State(state): State<Arc<AppState>>,
    session: Session,
    client: ClientAddr,
) -> Result<Json<ApiResponse<SessionInfo>>, ApiError> {
    let caller = resolve(&state, &session, client).await?;

    let name = match caller.principal.user_id() {
        Some(id) => state
            .shared
            .credentials
            .find_by_id(id)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .map(|u| u.name),
        None => None,
    };

    Ok(Json(ApiResponse::success(SessionInfo {
        authenticated: caller.principal.is_authenticated(),
        user_id: caller.principal.user_id().map(|id| id.value()),
        name,
        privilege: caller.principal.privilege(),
    })))
}
