use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format_timestamp;
use crate::table::TableRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "courseName")]
    pub course_name: Option<String>,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn created(&self) -> String {
        format_timestamp(self.created_at.as_ref())
    }

    pub fn updated(&self) -> String {
        format_timestamp(self.updated_at.as_ref())
    }
}

impl TableRow for Assignment {
    fn row_id(&self) -> i64 {
        self.id
    }
}
