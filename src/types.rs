//! Shared types used across the codebase

use serde::{Deserialize, Deserializer};

use crate::config;

/// Offset/limit window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    /// Build a page from raw query values, clamping to configured bounds
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        let api = &config::config().api;
        Self::clamped(skip, limit, api.default_page_limit, api.max_page_limit)
    }

    fn clamped(skip: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        Self {
            skip: skip.unwrap_or(0).max(0),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    /// 1-based page number for list envelopes
    pub fn number(&self) -> i64 {
        self.skip / self.limit + 1
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent -> `None`, `null` -> `Some(None)`,
/// value -> `Some(Some(v))`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        code: Option<Option<String>>,
    }

    #[test]
    fn nullable_distinguishes_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.code, None);

        let cleared: Patch = serde_json::from_str(r#"{"code": null}"#).unwrap();
        assert_eq!(cleared.code, Some(None));

        let set: Patch = serde_json::from_str(r#"{"code": "INV-1"}"#).unwrap();
        assert_eq!(set.code, Some(Some("INV-1".to_string())));
    }

    #[test]
    fn page_clamps_limits() {
        let page = Page::clamped(Some(-5), Some(5000), 100, 1000);
        assert_eq!(page, Page { skip: 0, limit: 1000 });

        let page = Page::clamped(None, Some(0), 100, 1000);
        assert_eq!(page.limit, 1);

        let page = Page::clamped(Some(200), None, 100, 1000);
        assert_eq!(page.number(), 3);
    }
}
