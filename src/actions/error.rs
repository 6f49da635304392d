use std::fmt;

use thiserror::Error;

use crate::config::Messages;
use crate::services::{CredentialError, SettingsError};

/// Which write failed, for the generic "... gescheitert" messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Add,
    Update,
    Password,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add failed"),
            Self::Update => f.write_str("update failed"),
            Self::Password => f.write_str("password change failed"),
        }
    }
}

/// Terminal failure of a dispatched action. Never retried.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("insufficient privilege for {0}")]
    Forbidden(&'static str),

    #[error("incomplete data, missing {0:?}")]
    IncompleteData(Vec<&'static str>),

    #[error("missing id")]
    MissingId,

    #[error("invalid id: {0:?}")]
    InvalidId(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("old password incorrect")]
    WrongPassword,

    #[error("name already taken")]
    Duplicate,

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("{0}")]
    Failed(FailureKind),

    #[error("store error: {0}")]
    Store(String),
}

/// Entry of the configurable message table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    InvalidRequest,
    Forbidden,
    IncompleteData,
    MissingId,
    InvalidId,
    InvalidCredentials,
    WrongPassword,
    DuplicateName,
    InvalidValue,
    AddFailed,
    UpdateFailed,
    PasswordFailed,
    StoreError,
}

impl MessageKey {
    #[must_use]
    pub fn text(self, messages: &Messages) -> &str {
        match self {
            Self::InvalidRequest => &messages.invalid_request,
            Self::Forbidden => &messages.forbidden,
            Self::IncompleteData => &messages.incomplete_data,
            Self::MissingId => &messages.missing_id,
            Self::InvalidId => &messages.invalid_id,
            Self::InvalidCredentials => &messages.invalid_credentials,
            Self::WrongPassword => &messages.wrong_password,
            Self::DuplicateName => &messages.duplicate_name,
            Self::InvalidValue => &messages.invalid_value,
            Self::AddFailed => &messages.add_failed,
            Self::UpdateFailed => &messages.update_failed,
            Self::PasswordFailed => &messages.password_failed,
            Self::StoreError => &messages.store_error,
        }
    }
}

impl ActionError {
    #[must_use]
    pub const fn message_key(&self) -> MessageKey {
        match self {
            Self::UnknownAction(_) => MessageKey::InvalidRequest,
            Self::Forbidden(_) => MessageKey::Forbidden,
            Self::IncompleteData(_) => MessageKey::IncompleteData,
            Self::MissingId => MessageKey::MissingId,
            Self::InvalidId(_) => MessageKey::InvalidId,
            Self::InvalidCredentials => MessageKey::InvalidCredentials,
            Self::WrongPassword => MessageKey::WrongPassword,
            Self::Duplicate => MessageKey::DuplicateName,
            Self::InvalidValue(_) => MessageKey::InvalidValue,
            Self::Failed(FailureKind::Add) => MessageKey::AddFailed,
            Self::Failed(FailureKind::Update) => MessageKey::UpdateFailed,
            Self::Failed(FailureKind::Password) => MessageKey::PasswordFailed,
            Self::Store(_) => MessageKey::StoreError,
        }
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownAction(_) => "unknown_action",
            Self::Forbidden(_) => "forbidden",
            Self::IncompleteData(_) => "incomplete_data",
            Self::MissingId => "missing_id",
            Self::InvalidId(_) => "invalid_id",
            Self::InvalidCredentials => "invalid_credentials",
            Self::WrongPassword => "wrong_password",
            Self::Duplicate => "duplicate",
            Self::InvalidValue(_) => "invalid_value",
            Self::Failed(_) => "failed",
            Self::Store(_) => "store_error",
        }
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(format!("{err:#}"))
    }
}

impl From<CredentialError> for ActionError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Duplicate => Self::Duplicate,
            CredentialError::NotFound(id) => Self::InvalidId(id.to_string()),
            CredentialError::Validation(msg) => Self::InvalidValue(msg),
            CredentialError::Database(msg) => Self::Store(msg),
        }
    }
}

impl From<SettingsError> for ActionError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::InvalidValue { .. } => Self::InvalidValue(err.to_string()),
            SettingsError::Persist(msg) => Self::Store(msg),
        }
    }
}
