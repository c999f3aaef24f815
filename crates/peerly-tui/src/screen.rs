//! Top-level sections shown in the tab bar.
//!
//! A section is only a shortcut to a location; switching still goes
//! through the router, so its guard applies.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    #[default]
    Home,
    Assignments,
    Duties,
}

impl Section {
    pub const ALL: [Section; 3] = [Self::Home, Self::Assignments, Self::Duties];

    pub fn number(self) -> u8 {
        match self {
            Self::Home => 1,
            Self::Assignments => 2,
            Self::Duties => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Home),
            2 => Some(Self::Assignments),
            3 => Some(Self::Duties),
            _ => None,
        }
    }

    /// Next section in tab order (wraps).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous section in tab order (wraps).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Assignments => "Assignments",
            Self::Duties => "Duties",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Assignments => "/assignments",
            Self::Duties => "/duties",
        }
    }

    /// The section a location belongs to, by its first path segment.
    pub fn for_path(path: &str) -> Option<Self> {
        let first = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        match first {
            "" => Some(Self::Home),
            "assignments" | "courses" => Some(Self::Assignments),
            "duties" => Some(Self::Duties),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_trip_and_cycle() {
        for section in Section::ALL {
            assert_eq!(Section::from_number(section.number()), Some(section));
        }
        assert_eq!(Section::Duties.next(), Section::Home);
        assert_eq!(Section::Home.prev(), Section::Duties);
        assert_eq!(Section::from_number(9), None);
    }

    #[test]
    fn sections_follow_first_segment() {
        assert_eq!(Section::for_path("/"), Some(Section::Home));
        assert_eq!(Section::for_path("/duties/edit/3"), Some(Section::Duties));
        assert_eq!(Section::for_path("/courses/4/assignments"), Some(Section::Assignments));
        assert_eq!(Section::for_path("/assignments?tab=1"), Some(Section::Assignments));
        assert_eq!(Section::for_path("/profile"), None);
    }
}
