//! Query-string parameters of the catalog list pages.

use std::collections::HashMap;

use crate::query::{Pagination, Sort, DEFAULT_PAGE};
use crate::text::split_list;

/// Page size of catalog lists when `limit` is absent.
pub const LIST_PAGE_SIZE: u32 = 20;

/// Typed access to a request's query parameters.
#[derive(Debug, Clone, Copy)]
pub struct ListParams<'a> {
    raw: &'a HashMap<String, String>,
}

impl<'a> ListParams<'a> {
    /// Wrap parsed query parameters.
    #[must_use]
    pub fn new(raw: &'a HashMap<String, String>) -> Self {
        Self { raw }
    }

    /// A trimmed, non-empty text parameter.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.raw
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// A comma-separated list parameter; empty when absent.
    #[must_use]
    pub fn list(&self, name: &str) -> Vec<String> {
        split_list(self.raw.get(name).map(String::as_str))
    }

    /// An integer parameter; `None` when absent or unparsable.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        self.text(name).and_then(|v| v.parse().ok())
    }

    /// The `sort` parameter, or `default` when absent.
    #[must_use]
    pub fn sort(&self, default: &str) -> Sort {
        self.text("sort")
            .and_then(Sort::parse_param)
            .or_else(|| Sort::parse_param(default))
            .unwrap_or_else(|| Sort::new("name", crate::query::Direction::Asc))
    }

    /// The `page`/`limit` window with a [`LIST_PAGE_SIZE`] default.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        let page = self
            .int("page")
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(DEFAULT_PAGE);
        let limit = self
            .int("limit")
            .and_then(|l| u32::try_from(l).ok())
            .unwrap_or(LIST_PAGE_SIZE);
        Pagination::new(page, limit)
    }
}

/// `%text%`, for substring matching with `LIKE`.
#[must_use]
pub fn contains_pattern(text: &str) -> String {
    format!("%{text}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_text_and_list() {
        let raw = params(&[("search", "  pfi "), ("tas", "oncology, vaccines,"), ("empty", " ")]);
        let p = ListParams::new(&raw);
        assert_eq!(p.text("search"), Some("pfi"));
        assert_eq!(p.text("empty"), None);
        assert_eq!(p.list("tas"), vec!["oncology", "vaccines"]);
        assert!(p.list("regions").is_empty());
    }

    #[test]
    fn test_int() {
        let raw = params(&[("minMarketCap", "150"), ("maxMarketCap", "lots")]);
        let p = ListParams::new(&raw);
        assert_eq!(p.int("minMarketCap"), Some(150));
        assert_eq!(p.int("maxMarketCap"), None);
    }

    #[test]
    fn test_sort_default_and_explicit() {
        let raw = params(&[]);
        assert_eq!(
            ListParams::new(&raw).sort("domain_asc"),
            Sort::new("domain", Direction::Asc)
        );

        let raw = params(&[("sort", "marketCap_desc")]);
        assert_eq!(
            ListParams::new(&raw).sort("name_asc"),
            Sort::new("marketCap", Direction::Desc)
        );
    }

    #[test]
    fn test_pagination_defaults() {
        let raw = params(&[]);
        assert_eq!(ListParams::new(&raw).pagination(), Pagination::new(1, 20));

        let raw = params(&[("page", "3"), ("limit", "5")]);
        assert_eq!(ListParams::new(&raw).pagination(), Pagination::new(3, 5));

        let raw = params(&[("page", "-2")]);
        assert_eq!(ListParams::new(&raw).pagination().page, 1);
    }
}
