use serde::{Deserialize, Serialize};

/// Course entity - immutable reference data, admin-seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i32,
    pub name: String,
    pub offering_unit: String,
    pub subject: String,
    pub course_number: String,
}
