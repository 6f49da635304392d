//! `POST /post/{target}`: the single entry point for mutating actions.
//!
//! Every request ends in exactly one response built by [`respond`].

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::warn;

use super::AppState;
use super::client::ClientAddr;
use super::session::{TOKEN_KEY, resolve};
use crate::actions::{Action, ActionError, Fields, Outcome, links};
use crate::config::Config;
use crate::db::repositories::user::generate_session_token;

#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    #[serde(rename = "continue")]
    pub continue_to: Option<String>,
}

/// Action name for a form posted to `target`: `user` with `action=add`
/// becomes `user.add`, a target without an `action` field is the name.
#[must_use]
pub fn action_name(target: &str, fields: &Fields) -> String {
    match fields.get("action") {
        Some(sub) if !sub.is_empty() => format!("{target}.{sub}"),
        _ => target.to_string(),
    }
}

/// Form pairs in submission order.
#[must_use]
pub fn parse_form(body: &[u8]) -> Fields {
    url::form_urlencoded::parse(body).into_owned().collect()
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
    Query(query): Query<PostQuery>,
    session: Session,
    client: ClientAddr,
    body: Bytes,
) -> Response {
    let config = state.config().read().await.clone();
    let fields = parse_form(&body);
    let name = action_name(&target, &fields);

    let mut caller = match resolve(&state, &session, client).await {
        Ok(caller) => caller,
        Err(e) => return e.into_response(),
    };

    let is_login = name == Action::Login.name();
    if is_login {
        // A fresh token per attempt, so a planted cookie never gets promoted
        caller.ctx.token = generate_session_token();
        caller.ctx.continue_to = Some(links::sanitize_continue(query.continue_to.as_deref()));
    }

    let result = state
        .dispatcher()
        .dispatch(&name, &caller.principal, &caller.ctx, &fields)
        .await;

    if result.is_ok() {
        if is_login {
            if let Err(e) = session.cycle_id().await {
                warn!(error = %e, "Failed to cycle session id");
            }
            if let Err(e) = session.insert(TOKEN_KEY, &caller.ctx.token).await {
                warn!(error = %e, "Failed to store session token");
            }
        } else if name == Action::Logout.name()
            && let Err(e) = session.flush().await
        {
            warn!(error = %e, "Failed to flush session");
        }
    }

    respond(result, &config, query.continue_to.as_deref())
}

/// Turns the dispatch result into the one response the client gets.
pub fn respond(
    result: Result<Outcome, ActionError>,
    config: &Config,
    continue_to: Option<&str>,
) -> Response {
    match result {
        Ok(Outcome::Status(text)) => (StatusCode::OK, text).into_response(),
        Ok(Outcome::Created(id)) => (StatusCode::OK, id.to_string()).into_response(),
        Ok(Outcome::Redirect(location)) => Redirect::to(&location).into_response(),
        Err(ActionError::InvalidCredentials) => {
            let target = links::sanitize_continue(continue_to);
            Redirect::to(&links::login_failed(Some(&target))).into_response()
        }
        Err(e) => {
            let message = e.message_key().text(&config.messages).to_string();
            let status = status_for(&e);

            let body = match &e {
                ActionError::Store(detail) => {
                    tracing::error!(error = %detail, "Action failed in store");
                    if config.general.debug {
                        format!("{message}: {detail}")
                    } else {
                        message
                    }
                }
                _ => message,
            };

            (status, body).into_response()
        }
    }
}

const fn status_for(err: &ActionError) -> StatusCode {
    match err {
        ActionError::Forbidden(_) => StatusCode::FORBIDDEN,
        ActionError::InvalidId(_) => StatusCode::NOT_FOUND,
        ActionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ActionError::UnknownAction(_)
        | ActionError::IncompleteData(_)
        | ActionError::MissingId
        | ActionError::InvalidCredentials
        | ActionError::WrongPassword
        | ActionError::Duplicate
        | ActionError::InvalidValue(_)
        | ActionError::Failed(_) => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::FailureKind;

    #[test]
    fn action_name_joins_target_and_sub_action() {
        let fields = parse_form(b"action=delete&id=4");
        assert_eq!(action_name("entry", &fields), "entry.delete");
        assert_eq!(action_name("login", &parse_form(b"name=a")), "login");
        assert_eq!(action_name("logout", &parse_form(b"action=")), "logout");
    }

    #[test]
    fn form_keeps_order_and_decodes() {
        let fields = parse_form(b"name=M%C3%BCller&role=3&name=x");
        assert_eq!(fields.get("name"), Some("Müller"));
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["name", "role", "name"]);
    }

    #[test]
    fn store_detail_only_in_debug() {
        let mut config = Config::default();
        let hidden = respond(Err(ActionError::Store("disk full".to_string())), &config, None);
        assert_eq!(hidden.status(), StatusCode::INTERNAL_SERVER_ERROR);

        config.general.debug = true;
        let shown = respond(Err(ActionError::Store("disk full".to_string())), &config, None);
        assert_eq!(shown.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn failed_login_redirects_back_to_login() {
        let config = Config::default();
        let response = respond(
            Err(ActionError::InvalidCredentials),
            &config,
            Some("https://evil.example"),
        );
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/?source=login&attempt=failed&continue=%2F"
        );
    }

    #[test]
    fn statuses() {
        assert_eq!(status_for(&ActionError::Forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&ActionError::InvalidId("9".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&ActionError::Failed(FailureKind::Add)),
            StatusCode::BAD_REQUEST
        );
    }
}
