// ── Role hierarchy ──
//
// Ordinal comparison drives every route guard: a route declaring a
// minimum role admits that role and everything above it.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

/// Roles known to the backend, lowest privilege first.
///
/// The derive order is the privilege order; `Ord` is what the guard uses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    #[default]
    #[strum(to_string = "Guest")]
    Guest,
    #[strum(to_string = "Student")]
    Student,
    #[strum(to_string = "Teaching Assistant", serialize = "TA")]
    TeachingAssistant,
    #[strum(to_string = "Instructor")]
    Instructor,
    #[strum(to_string = "Administrator", serialize = "Admin")]
    Administrator,
    #[strum(to_string = "Super Administrator", serialize = "Super Admin")]
    SuperAdministrator,
}

impl Role {
    /// `true` when this role satisfies a `minimum` requirement.
    pub fn at_least(self, minimum: Role) -> bool {
        self >= minimum
    }

    /// Parse a backend role name, treating unknown names as `Guest`.
    pub fn from_backend(name: &str) -> Self {
        Self::from_str(name.trim()).unwrap_or_else(|_| {
            tracing::warn!(role = name, "unknown role name, treating as guest");
            Self::Guest
        })
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_backend(&name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn hierarchy_is_ordinal() {
        let all: Vec<Role> = Role::iter().collect();
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
        assert!(Role::Guest < Role::Student);
        assert!(Role::Student < Role::TeachingAssistant);
        assert!(Role::TeachingAssistant < Role::Instructor);
        assert!(Role::Instructor < Role::Administrator);
        assert!(Role::Administrator < Role::SuperAdministrator);
    }

    #[test]
    fn at_least_includes_equal() {
        assert!(Role::Instructor.at_least(Role::Instructor));
        assert!(Role::Administrator.at_least(Role::TeachingAssistant));
        assert!(!Role::Student.at_least(Role::TeachingAssistant));
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!(Role::from_backend("Teaching Assistant"), Role::TeachingAssistant);
        assert_eq!(Role::from_backend("ta"), Role::TeachingAssistant);
        assert_eq!(Role::from_backend("Super Administrator"), Role::SuperAdministrator);
        assert_eq!(Role::from_backend("instructor"), Role::Instructor);
        assert_eq!(Role::from_backend("Janitor"), Role::Guest);
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Role::TeachingAssistant).unwrap();
        assert_eq!(json, "\"Teaching Assistant\"");
        let back: Role = serde_json::from_str("\"Administrator\"").unwrap();
        assert_eq!(back, Role::Administrator);
    }
}
