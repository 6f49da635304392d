use serde::Serialize;

/// Successful result of a dispatched action. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// Plain status literal such as `updated` or `deleted`.
    Status(&'static str),
    /// Id of a newly created record.
    Created(i32),
    /// Site-relative location to continue at.
    Redirect(String),
}

impl Outcome {
    pub const UPDATED: Self = Self::Status("updated");
    pub const DELETED: Self = Self::Status("deleted");

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Created(_) => "created",
            Self::Redirect(_) => "redirect",
        }
    }
}
