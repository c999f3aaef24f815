use serde::{Deserialize, Serialize};

use crate::table::TableRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub directory_path: Option<String>,
    #[serde(default)]
    pub instructor_id: Option<i64>,
    #[serde(default)]
    pub institution_id: Option<i64>,
    #[serde(default)]
    pub private: bool,
}

impl TableRow for Course {
    fn row_id(&self) -> i64 {
        self.id
    }
}
