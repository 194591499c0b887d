//! Cursor pagination shapes shared by list operations

use serde::{Deserialize, Serialize};

/// Requested page window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    /// Maximum records to return; the service default applies when absent
    pub limit: Option<usize>,
    /// Opaque cursor returned by the previous page
    pub cursor: Option<String>,
}

impl PageRequest {
    /// First page with the given limit
    pub fn first(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            cursor: None,
        }
    }

    /// Page following `cursor`
    pub fn after(limit: usize, cursor: impl Into<String>) -> Self {
        Self {
            limit: Some(limit),
            cursor: Some(cursor.into()),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records in this page
    pub records: Vec<T>,
    /// Whether another page follows
    pub has_more: bool,
    /// Cursor for the next page, present when `has_more`
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    /// Cut an ordered sequence into a page of at most `limit` items.
    ///
    /// `cursor_of` renders the cursor from the last record kept.
    pub fn from_ordered<I, F>(items: I, limit: usize, cursor_of: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> String,
    {
        let mut records: Vec<T> = items.into_iter().take(limit.saturating_add(1)).collect();
        let has_more = records.len() > limit;
        records.truncate(limit);
        let cursor = if has_more {
            records.last().map(cursor_of)
        } else {
            None
        };
        Self {
            records,
            has_more,
            cursor,
        }
    }

    /// Map every record
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            records: self.records.into_iter().map(f).collect(),
            has_more: self.has_more,
            cursor: self.cursor,
        }
    }
}
