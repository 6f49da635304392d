//! Binds an opaque session token to the network address it was issued to.
//!
//! A token presented from any other address authenticates nobody. The
//! mismatch is logged but the caller only ever sees an anonymous principal,
//! the same as for a token that was never issued.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{BoundAddress, Principal, Privilege};
use crate::actions::ActionError;
use crate::services::CredentialStore;

/// Transport facts about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Opaque session token presented by the client.
    pub token: String,
    /// Observed source address.
    pub address: BoundAddress,
    /// Already sanitised post-login destination.
    pub continue_to: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(token: impl Into<String>, address: BoundAddress) -> Self {
        Self {
            token: token.into(),
            address,
            continue_to: None,
        }
    }
}

#[derive(Clone)]
pub struct SessionBinder {
    credentials: Arc<dyn CredentialStore>,
}

impl SessionBinder {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Derives the principal for this request. Nothing is cached.
    pub async fn bind(&self, ctx: &RequestContext) -> Result<Principal, ActionError> {
        if ctx.token.is_empty() {
            return Ok(Principal::Anonymous);
        }

        let Some(user) = self.credentials.find_by_session(&ctx.token).await? else {
            return Ok(Principal::Anonymous);
        };

        match user.bound_address {
            Some(bound) if bound == ctx.address => Ok(Principal::Authenticated {
                user_id: user.id,
                privilege: user.privilege,
            }),
            bound => {
                warn!(
                    event = "session_address_mismatch",
                    user_id = %user.id,
                    bound = ?bound.map(|a| a.to_string()),
                    observed = %ctx.address,
                    "Session token presented from a different address"
                );
                Ok(Principal::Anonymous)
            }
        }
    }

    /// Checks the credentials and binds `ctx.token` and `ctx.address` to the
    /// account. Unknown names and wrong passwords are indistinguishable and
    /// leave the row untouched.
    pub async fn login(
        &self,
        name: &str,
        password: &str,
        ctx: &RequestContext,
    ) -> Result<Privilege, ActionError> {
        if name.is_empty() || password.is_empty() || ctx.token.is_empty() {
            return Err(ActionError::InvalidCredentials);
        }

        let Some(user) = self.credentials.verify_credentials(name, password).await? else {
            debug!(name, "Login rejected");
            return Err(ActionError::InvalidCredentials);
        };

        self.credentials
            .set_session(user.id, &ctx.token, ctx.address)
            .await?;

        info!(user_id = %user.id, address = %ctx.address, "User logged in");
        Ok(user.privilege)
    }

    /// Clears the binding held by `ctx.token`; succeeds only if exactly one
    /// row was cleared.
    pub async fn logout(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        let cleared = self.credentials.clear_session_by_token(&ctx.token).await?;
        if cleared == 1 {
            info!(address = %ctx.address, "User logged out");
            Ok(())
        } else {
            Err(ActionError::Forbidden("logout"))
        }
    }
}
