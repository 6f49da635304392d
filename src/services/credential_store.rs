//! Port for user records: identity, password hash, privilege and the live
//! session binding.
//!
//! Consumed by the session binder and the action handlers. Every mutating
//! call touches at most one row, matched by primary key or by the session
//! token, so a transport-level retry is harmless.

use serde::Serialize;
use thiserror::Error;

use crate::auth::{BoundAddress, Privilege};
use crate::domain::UserId;

/// Errors specific to credential store operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("User name already taken")]
    Duplicate,

    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("Invalid value: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for CredentialError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => Self::Duplicate,
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for CredentialError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sea_orm::DbErr>() {
            Ok(db) => db.into(),
            Err(other) => Self::Database(format!("{other:#}")),
        }
    }
}

/// A user row without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub privilege: Privilege,
    #[serde(skip)]
    pub bound_address: Option<BoundAddress>,
    #[serde(skip)]
    pub session_token: Option<String>,
}

impl UserRecord {
    /// A session is live only when both halves of the binding are present.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.bound_address.is_some() && self.session_token.is_some()
    }
}

#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_session(&self, token: &str) -> Result<Option<UserRecord>, CredentialError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, CredentialError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, CredentialError>;

    async fn list(&self) -> Result<Vec<UserRecord>, CredentialError>;

    async fn count(&self) -> Result<u64, CredentialError>;

    /// Looks up `name` and checks `password` against the stored hash.
    ///
    /// Returns `None` both for an unknown name and for a wrong password.
    /// Never writes to the row.
    async fn verify_credentials(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, CredentialError>;

    async fn verify_password(&self, id: UserId, password: &str) -> Result<bool, CredentialError>;

    /// # Errors
    ///
    /// Returns [`CredentialError::Duplicate`] if `name` is already taken.
    async fn create(
        &self,
        name: &str,
        password: &str,
        privilege: Privilege,
    ) -> Result<UserId, CredentialError>;

    async fn update_name(&self, id: UserId, name: &str) -> Result<(), CredentialError>;

    async fn update_password(&self, id: UserId, password: &str) -> Result<(), CredentialError>;

    async fn update_privilege(&self, id: UserId, privilege: Privilege)
    -> Result<(), CredentialError>;

    async fn delete(&self, id: UserId) -> Result<bool, CredentialError>;

    /// Records token and address together.
    async fn set_session(
        &self,
        id: UserId,
        token: &str,
        address: BoundAddress,
    ) -> Result<(), CredentialError>;

    async fn clear_session(&self, id: UserId) -> Result<(), CredentialError>;

    /// Clears token and address on the row holding `token`; returns the
    /// number of rows affected.
    async fn clear_session_by_token(&self, token: &str) -> Result<u64, CredentialError>;
}
