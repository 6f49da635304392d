use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::error::ActionError;
use super::fields::Fields;
use super::handlers::Handlers;
use super::outcome::Outcome;
use super::registry::ActionRegistry;
use crate::auth::{Principal, RequestContext, SessionBinder, permits};

/// Resolves an action by name, enforces its preconditions and runs its
/// handler. Exactly one outcome or error comes back per call.
#[derive(Clone)]
pub struct Dispatcher {
    registry: ActionRegistry,
    handlers: Handlers,
    timeout: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(handlers: Handlers, timeout: Duration) -> Self {
        Self {
            registry: ActionRegistry::new(),
            handlers,
            timeout,
        }
    }

    #[must_use]
    pub const fn binder(&self) -> &SessionBinder {
        self.handlers.binder()
    }

    #[instrument(skip_all, fields(action = name, user_id = ?principal.user_id()))]
    pub async fn dispatch(
        &self,
        name: &str,
        principal: &Principal,
        ctx: &RequestContext,
        fields: &Fields,
    ) -> Result<Outcome, ActionError> {
        let result = self.run(name, principal, ctx, fields).await;

        let outcome = match &result {
            Ok(outcome) => outcome.kind(),
            Err(e) => e.kind(),
        };
        // Unknown names are folded together to keep label cardinality bounded
        let label = self
            .registry
            .lookup(name)
            .map_or("unknown", |action| action.name());
        metrics::counter!("actions_dispatched_total", "action" => label, "outcome" => outcome)
            .increment(1);

        result
    }

    async fn run(
        &self,
        name: &str,
        principal: &Principal,
        ctx: &RequestContext,
        fields: &Fields,
    ) -> Result<Outcome, ActionError> {
        let Some(action) = self.registry.lookup(name) else {
            debug!("Unknown action");
            return Err(ActionError::UnknownAction(name.to_string()));
        };

        // Privilege is checked before any store is touched
        if !permits(principal, action.requirement()) {
            warn!(privilege = %principal.privilege(), "Action denied");
            return Err(ActionError::Forbidden(action.name()));
        }

        let missing = fields.missing(action.required_fields());
        if !missing.is_empty() {
            return Err(if action.needs_only_id() {
                ActionError::MissingId
            } else {
                ActionError::IncompleteData(missing)
            });
        }

        tokio::time::timeout(
            self.timeout,
            self.handlers.execute(action, principal, ctx, fields),
        )
        .await
        .unwrap_or_else(|_| {
            warn!(timeout = ?self.timeout, "Action timed out");
            Err(ActionError::Store("store call timed out".to_string()))
        })
    }
}
