//! Post filter, sort, and pagination model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Fixed page size for post listings.
pub const PAGE_SIZE: u64 = 20;

/// Sort modes for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    /// Descending by post creation timestamp.
    #[default]
    Time,
    /// Descending by latest activity: the newest comment timestamp, or the
    /// post's own timestamp when it has no comments.
    Activity,
}

impl std::str::FromStr for PostSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Self::Time),
            "activity" => Ok(Self::Activity),
            other => Err(DomainError::validation(format!(
                "Unknown sort mode '{other}': expected 'time' or 'activity'"
            ))),
        }
    }
}

/// Filter parameters for a post listing query.
///
/// All supplied filters are conjunctive. The date range applies to the due
/// date only, as a half-open interval: inclusive of `start_date` (compared
/// as strictly-greater-than the preceding day) and exclusive of `end_date`.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub courses: Vec<i32>,
    pub categories: Vec<i32>,
    pub query: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort: PostSort,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u64,
}

impl PostFilter {
    /// Row offset of the requested page.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1) * PAGE_SIZE
    }
}

/// One page of results plus the pre-pagination total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets_are_one_based() {
        let mut filter = PostFilter {
            page: 1,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 0);

        filter.page = 3;
        assert_eq!(filter.offset(), 40);

        // page 0 behaves like page 1
        filter.page = 0;
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn sort_parses_known_modes_only() {
        assert_eq!("time".parse::<PostSort>().unwrap(), PostSort::Time);
        assert_eq!("activity".parse::<PostSort>().unwrap(), PostSort::Activity);
        assert!("newest".parse::<PostSort>().is_err());
    }
}
