use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::table::TableRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Full name, else login name, else `User #<id>`. Blank strings count
    /// as missing.
    pub fn display_name(&self) -> String {
        [&self.full_name, &self.name]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("User #{}", self.id))
    }
}

impl TableRow for User {
    fn row_id(&self) -> i64 {
        self.id
    }
}

/// `id -> display name` lookup for "created by" style columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory(HashMap<i64, String>);

impl UserDirectory {
    pub fn name(&self, id: Option<i64>) -> String {
        match id {
            Some(id) => self
                .0
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("User #{id}")),
            None => String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<User> for UserDirectory {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self(iter.into_iter().map(|u| (u.id, u.display_name())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: Option<&str>, full_name: Option<&str>) -> User {
        User {
            id,
            name: name.map(String::from),
            full_name: full_name.map(String::from),
            email: None,
        }
    }

    #[test]
    fn display_name_falls_back() {
        assert_eq!(user(1, Some("ada"), Some("Ada Lovelace")).display_name(), "Ada Lovelace");
        assert_eq!(user(2, Some("grace"), Some("")).display_name(), "grace");
        assert_eq!(user(3, None, None).display_name(), "User #3");
    }

    #[test]
    fn directory_names_unknown_ids() {
        let dir: UserDirectory = vec![user(1, Some("ada"), None)].into_iter().collect();
        assert_eq!(dir.name(Some(1)), "ada");
        assert_eq!(dir.name(Some(9)), "User #9");
        assert_eq!(dir.name(None), "");
    }
}
