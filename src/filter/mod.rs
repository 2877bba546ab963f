//! Paging and time-window filter read from a list page's query string and
//! forwarded to the data store.

use serde::{Deserialize, Serialize};

use crate::forms::FormValues;

pub const DEFAULT_LIMIT: u8 = 20;
pub const MAX_LIMIT: u8 = 250;

pub const PAGE_KEY: &str = "page";
pub const LIMIT_KEY: &str = "limit";
pub const CREATED_BEFORE_KEY: &str = "createdBefore";
pub const CREATED_AFTER_KEY: &str = "createdAfter";
pub const UPDATED_BEFORE_KEY: &str = "updatedBefore";
pub const UPDATED_AFTER_KEY: &str = "updatedAfter";
pub const INCLUDE_ARCHIVED_KEY: &str = "includeArchived";
pub const SORT_BY_KEY: &str = "sortBy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub page: u64,
    pub limit: u8,
    pub created_before: Option<u64>,
    pub created_after: Option<u64>,
    pub updated_before: Option<u64>,
    pub updated_after: Option<u64>,
    pub include_archived: bool,
    pub sort_by: SortDirection,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            created_before: None,
            created_after: None,
            updated_before: None,
            updated_after: None,
            include_archived: false,
            sort_by: SortDirection::Asc,
        }
    }
}

impl QueryFilter {
    /// Builds a filter from a raw query string. Unparseable values fall back
    /// to their defaults; an oversized limit is capped.
    pub fn from_query(query: Option<&str>) -> Self {
        let values = FormValues::parse(query.unwrap_or("").as_bytes());
        let defaults = Self::default();

        let page = values.optional::<u64>(PAGE_KEY).filter(|p| *p > 0).unwrap_or(defaults.page);

        let requested_limit = values.optional::<u16>(LIMIT_KEY).filter(|l| *l > 0);
        let limit = match requested_limit {
            Some(l) if l > MAX_LIMIT as u16 => {
                tracing::debug!("Limit {} exceeds max {}, capping to max", l, MAX_LIMIT);
                MAX_LIMIT
            }
            Some(l) => l as u8,
            None => defaults.limit,
        };

        let sort_by = match values.get(SORT_BY_KEY) {
            Some(s) if s.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };

        Self {
            page,
            limit,
            created_before: values.optional::<u64>(CREATED_BEFORE_KEY).filter(|v| *v > 0),
            created_after: values.optional::<u64>(CREATED_AFTER_KEY).filter(|v| *v > 0),
            updated_before: values.optional::<u64>(UPDATED_BEFORE_KEY).filter(|v| *v > 0),
            updated_after: values.optional::<u64>(UPDATED_AFTER_KEY).filter(|v| *v > 0),
            include_archived: values.value(INCLUDE_ARCHIVED_KEY),
            sort_by,
        }
    }

    /// Query parameters for forwarding the filter to the backend.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (PAGE_KEY, self.page.to_string()),
            (LIMIT_KEY, self.limit.to_string()),
            (SORT_BY_KEY, self.sort_by.as_str().to_string()),
        ];

        let windows = [
            (CREATED_BEFORE_KEY, self.created_before),
            (CREATED_AFTER_KEY, self.created_after),
            (UPDATED_BEFORE_KEY, self.updated_before),
            (UPDATED_AFTER_KEY, self.updated_after),
        ];
        for (key, value) in windows {
            if let Some(v) = value {
                pairs.push((key, v.to_string()));
            }
        }

        if self.include_archived {
            pairs.push((INCLUDE_ARCHIVED_KEY, "true".to_string()));
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_query_gives_defaults() {
        assert_eq!(QueryFilter::from_query(None), QueryFilter::default());
        assert_eq!(QueryFilter::from_query(Some("")), QueryFilter::default());
    }

    #[test]
    fn parses_every_key() {
        let filter = QueryFilter::from_query(Some(
            "page=3&limit=50&createdBefore=200&createdAfter=100&updatedBefore=400&updatedAfter=300&includeArchived=true&sortBy=desc",
        ));
        assert_eq!(
            filter,
            QueryFilter {
                page: 3,
                limit: 50,
                created_before: Some(200),
                created_after: Some(100),
                updated_before: Some(400),
                updated_after: Some(300),
                include_archived: true,
                sort_by: SortDirection::Desc,
            }
        );
    }

    #[test]
    fn caps_and_defaults_bad_values() {
        let filter = QueryFilter::from_query(Some("page=0&limit=9000&sortBy=sideways"));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_LIMIT);
        assert_eq!(filter.sort_by, SortDirection::Asc);

        let filter = QueryFilter::from_query(Some("limit=abc"));
        assert_eq!(filter.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn query_pairs_skip_unset_windows() {
        let pairs = QueryFilter::default().to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                (PAGE_KEY, "1".to_string()),
                (LIMIT_KEY, "20".to_string()),
                (SORT_BY_KEY, "asc".to_string()),
            ]
        );
    }
}
