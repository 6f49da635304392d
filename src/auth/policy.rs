//! Principals and the authorization predicate.

use serde::Serialize;

use super::Privilege;
use crate::domain::UserId;

/// Identity derived for exactly one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Anonymous,
    Authenticated { user_id: UserId, privilege: Privilege },
}

impl Principal {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    /// Effective privilege; anonymous principals rank as [`Privilege::None`].
    #[must_use]
    pub const fn privilege(&self) -> Privilege {
        match self {
            Self::Anonymous => Privilege::None,
            Self::Authenticated { privilege, .. } => *privilege,
        }
    }
}

/// What an action demands of the caller.
///
/// `Anonymous` is an upper bound rather than a floor, which is why it is a
/// separate state check and not a privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    AtLeast(Privilege),
    Anonymous,
    Authenticated,
}

#[must_use]
pub const fn permits(principal: &Principal, requirement: Requirement) -> bool {
    match (requirement, principal) {
        (Requirement::Anonymous, Principal::Anonymous) => true,
        (Requirement::Anonymous, Principal::Authenticated { .. }) => false,
        (Requirement::Authenticated, p) => p.is_authenticated(),
        (Requirement::AtLeast(_), Principal::Anonymous) => false,
        (Requirement::AtLeast(floor), Principal::Authenticated { privilege, .. }) => {
            *privilege as i32 >= floor as i32
        }
    }
}

/// Level used for read-only views: visitors without a session get the
/// configured default.
#[must_use]
pub const fn view_level(principal: &Principal, anonymous_default: Privilege) -> Privilege {
    match principal {
        Principal::Anonymous => anonymous_default,
        Principal::Authenticated { privilege, .. } => *privilege,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(privilege: Privilege) -> Principal {
        Principal::Authenticated {
            user_id: UserId::new(1),
            privilege,
        }
    }

    #[test]
    fn floor_is_inclusive_and_monotonic() {
        for floor in Privilege::ALL {
            for level in Privilege::ALL {
                assert_eq!(
                    permits(&user(level), Requirement::AtLeast(floor)),
                    level >= floor,
                    "level {level} vs floor {floor}"
                );
            }
        }
    }

    #[test]
    fn anonymous_never_meets_a_floor() {
        for floor in Privilege::ALL {
            assert!(!permits(&Principal::Anonymous, Requirement::AtLeast(floor)));
        }
    }

    #[test]
    fn login_requires_being_logged_out() {
        assert!(permits(&Principal::Anonymous, Requirement::Anonymous));
        assert!(!permits(&user(Privilege::Admin), Requirement::Anonymous));
    }

    #[test]
    fn authenticated_accepts_suspended_accounts() {
        assert!(permits(&user(Privilege::None), Requirement::Authenticated));
        assert!(!permits(&Principal::Anonymous, Requirement::Authenticated));
    }

    #[test]
    fn view_level_falls_back_for_visitors() {
        assert_eq!(
            view_level(&Principal::Anonymous, Privilege::ViewBasic),
            Privilege::ViewBasic
        );
        assert_eq!(
            view_level(&user(Privilege::ViewAll), Privilege::ViewBasic),
            Privilege::ViewAll
        );
    }
}
