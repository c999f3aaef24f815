use serde::{Deserialize, Serialize};

use crate::table::TableRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub instructor_id: Option<i64>,
    #[serde(default)]
    pub private: bool,
}

impl Duty {
    /// Public duties are visible to everyone; private ones only to
    /// their creator.
    pub fn visible_to(&self, user_id: i64) -> bool {
        !self.private || self.instructor_id == Some(user_id)
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.instructor_id == Some(user_id)
    }
}

impl TableRow for Duty {
    fn row_id(&self) -> i64 {
        self.id
    }
}

/// Editable duty fields, sent as `{ "duty": { ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyForm {
    pub name: String,
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<i64>,
}

impl From<&Duty> for DutyForm {
    fn from(duty: &Duty) -> Self {
        Self {
            name: duty.name.clone(),
            private: duty.private,
            instructor_id: duty.instructor_id,
        }
    }
}
