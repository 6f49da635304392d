//! Closed, totally ordered privilege scale.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// Privilege level of a user account.
///
/// Higher levels are strict supersets of lower ones, so authorization is a
/// plain `>=` comparison on the derived ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Privilege {
    /// No rights at all, used to suspend an account.
    #[default]
    None = 0,
    /// Public view without teacher names (students).
    ViewBasic = 1,
    /// Full view (teachers).
    ViewAll = 2,
    /// Full view plus editing of entries.
    Edit = 3,
    /// Everything, including account and datastore management.
    Admin = 4,
}

impl Privilege {
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::ViewBasic,
        Self::ViewAll,
        Self::Edit,
        Self::Admin,
    ];

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ViewBasic => "basic",
            Self::ViewAll => "all",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown privilege level: {0:?}")]
pub struct UnknownPrivilege(pub String);

impl TryFrom<i32> for Privilege {
    type Error = UnknownPrivilege;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| p.code() == code)
            .ok_or_else(|| UnknownPrivilege(code.to_string()))
    }
}

impl FromStr for Privilege {
    type Err = UnknownPrivilege;

    /// Accepts the numeric codes `0..=4` and the level names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i32>() {
            return Self::try_from(code).map_err(|_| UnknownPrivilege(s.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "basic" | "view" => Ok(Self::ViewBasic),
            "all" | "teacher" => Ok(Self::ViewAll),
            "edit" | "editor" | "author" => Ok(Self::Edit),
            "admin" | "root" => Ok(Self::Admin),
            _ => Err(UnknownPrivilege(s.to_string())),
        }
    }
}

impl Serialize for Privilege {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.code() as u8)
    }
}

impl<'de> Deserialize<'de> for Privilege {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PrivilegeVisitor;

        impl de::Visitor<'_> for PrivilegeVisitor {
            type Value = Privilege;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a privilege code 0..=4 or a level name")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Privilege, E> {
                i32::try_from(v)
                    .ok()
                    .and_then(|code| Privilege::try_from(code).ok())
                    .ok_or_else(|| E::custom(UnknownPrivilege(v.to_string())))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Privilege, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom(UnknownPrivilege(v.to_string())))
                    .and_then(|v| self.visit_i64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Privilege, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PrivilegeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_monotonic() {
        for pair in Privilege::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(Privilege::Admin >= Privilege::Edit);
        assert!(Privilege::ViewBasic < Privilege::Edit);
    }

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("4".parse::<Privilege>().unwrap(), Privilege::Admin);
        assert_eq!("admin".parse::<Privilege>().unwrap(), Privilege::Admin);
        assert_eq!("Editor".parse::<Privilege>().unwrap(), Privilege::Edit);
        assert_eq!("0".parse::<Privilege>().unwrap(), Privilege::None);
        assert!("5".parse::<Privilege>().is_err());
        assert!("-1".parse::<Privilege>().is_err());
        assert!("superuser".parse::<Privilege>().is_err());
    }

    #[test]
    fn try_from_code_round_trips() {
        for p in Privilege::ALL {
            assert_eq!(Privilege::try_from(p.code()).unwrap(), p);
        }
        assert!(Privilege::try_from(9).is_err());
    }

    #[test]
    fn serde_uses_numeric_codes() {
        assert_eq!(serde_json::to_string(&Privilege::Edit).unwrap(), "3");
        let p: Privilege = serde_json::from_str("2").unwrap();
        assert_eq!(p, Privilege::ViewAll);
        let p: Privilege = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(p, Privilege::Admin);
    }
}
