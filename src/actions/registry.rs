use std::collections::HashMap;

use crate::auth::{Privilege, Requirement};

/// Form fields of an entry, in board column order.
pub const ENTRY_FIELDS: [&str; 9] = [
    "time", "teacher", "course", "subject", "duration", "sub", "change", "oldroom", "newroom",
];

const ENTRY_UPDATE_FIELDS: [&str; 10] = [
    "id", "time", "teacher", "course", "subject", "duration", "sub", "change", "oldroom", "newroom",
];

/// Every mutating operation the board accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    UserAdd,
    UserUpdate,
    UserDelete,
    EntryAdd,
    EntryUpdate,
    EntryDelete,
    Login,
    Logout,
    Password,
    Datastore,
    Settings,
    Account,
}

impl Action {
    pub const ALL: [Self; 12] = [
        Self::UserAdd,
        Self::UserUpdate,
        Self::UserDelete,
        Self::EntryAdd,
        Self::EntryUpdate,
        Self::EntryDelete,
        Self::Login,
        Self::Logout,
        Self::Password,
        Self::Datastore,
        Self::Settings,
        Self::Account,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserAdd => "user.add",
            Self::UserUpdate => "user.update",
            Self::UserDelete => "user.delete",
            Self::EntryAdd => "entry.add",
            Self::EntryUpdate => "entry.update",
            Self::EntryDelete => "entry.delete",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Password => "password",
            Self::Datastore => "datastore",
            Self::Settings => "settings",
            Self::Account => "account",
        }
    }

    #[must_use]
    pub const fn requirement(self) -> Requirement {
        match self {
            Self::UserAdd
            | Self::UserUpdate
            | Self::UserDelete
            | Self::Datastore
            | Self::Settings
            | Self::Account => Requirement::AtLeast(Privilege::Admin),
            Self::EntryAdd | Self::EntryUpdate | Self::EntryDelete => {
                Requirement::AtLeast(Privilege::Edit)
            }
            Self::Login => Requirement::Anonymous,
            Self::Logout | Self::Password => Requirement::Authenticated,
        }
    }

    /// Fields that must be submitted (possibly empty) before the handler
    /// runs. Login checks its credentials itself so that a missing field
    /// looks like a failed attempt.
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::UserAdd => &["name", "password", "role"],
            Self::UserUpdate | Self::UserDelete | Self::EntryDelete => &["id"],
            Self::EntryAdd => &ENTRY_FIELDS,
            Self::EntryUpdate => &ENTRY_UPDATE_FIELDS,
            Self::Login | Self::Logout => &[],
            Self::Password => &["oldpwd", "newpwd"],
            Self::Datastore => &["host", "base", "user", "pass"],
            Self::Settings => &["debug", "delold", "skipweekends", "privdefault"],
            Self::Account => &["name", "pwd"],
        }
    }

    /// Whether the only thing this action needs is a record id, in which
    /// case its absence gets the dedicated "missing id" message.
    #[must_use]
    pub fn needs_only_id(self) -> bool {
        self.required_fields() == ["id"]
    }
}

/// Lookup table from action name to action.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    actions: HashMap<&'static str, Action>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Action::ALL.into_iter().map(|a| (a.name(), a)).collect(),
        }
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Action> {
        self.actions.get(name).copied()
    }
}
