use serde::{Deserialize, Serialize};

/// Semester entity - immutable reference data.
///
/// The "current" semester is the most recently created row (highest id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub id: i32,
    pub year: i32,
    pub season: String,
}
