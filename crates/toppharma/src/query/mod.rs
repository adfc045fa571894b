//! Query options, sorting, pagination and the SELECT builder.
//!
//! [`QueryOptions`] is the contract between callers and data sources: a set
//! of field filters, one sort and a page window. Field names are the camelCase
//! names the API exposes; sources that talk to the database translate them
//! with [`column_name`].

mod builder;

pub use builder::{Filter, Select, Value};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Page number used when none is given.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used by data sources when none is given.
pub const DEFAULT_LIMIT: u32 = 10;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Apply the direction to an ascending ordering.
    #[must_use]
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// A field and direction to sort by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Field name.
    pub field: String,
    /// Direction.
    pub direction: Direction,
}

impl Sort {
    /// Sort by `field` in `direction`.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parse a `<field>_<direction>` parameter such as `marketCap_desc`.
    ///
    /// A missing or unknown direction means ascending.
    #[must_use]
    pub fn parse_param(value: &str) -> Option<Self> {
        let (field, direction) = match value.rsplit_once('_') {
            Some((field, dir)) => match dir.parse() {
                Ok(direction) => (field, direction),
                Err(_) => (value, Direction::Asc),
            },
            None => (value, Direction::Asc),
        };
        if field.is_empty() {
            None
        } else {
            Some(Self::new(field, direction))
        }
    }

    /// Render back to `<field>_<direction>`.
    #[must_use]
    pub fn to_param(&self) -> String {
        format!("{}_{}", self.field, self.direction)
    }
}

/// A page window (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Build a window, clamping page and limit to at least 1.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Zero-based index of the first row.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Inclusive zero-based row range of the page.
    #[must_use]
    pub fn range(&self) -> (u64, u64) {
        let start = self.offset();
        (start, start + u64::from(self.limit) - 1)
    }
}

/// A filter value in [`QueryOptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A set of accepted values.
    List(Vec<String>),
    /// A text value; contains `%` for pattern matching.
    Text(String),
    /// A number.
    Number(f64),
    /// A flag.
    Bool(bool),
}

impl FilterValue {
    /// Interpret a raw query-string value: `true`/`false` become flags,
    /// numbers become numbers and anything else, patterns included, stays
    /// text. Commas are not special; lists only come from typed callers.
    #[must_use]
    pub fn from_param(raw: &str) -> Self {
        if raw.contains('%') {
            return Self::Text(raw.to_string());
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw
                .parse::<f64>()
                .map_or_else(|_| Self::Text(raw.to_string()), Self::Number),
        }
    }

    /// Translate into a builder filter on `column`.
    ///
    /// Text containing `%` is a case-insensitive pattern, lists are `IN`
    /// and everything else is equality.
    #[must_use]
    pub fn to_filter(&self, column: &str) -> Filter {
        let column = column.to_string();
        match self {
            Self::Text(t) if t.contains('%') => Filter::ILike(column, t.clone()),
            Self::Text(t) => Filter::Eq(column, t.clone().into()),
            Self::List(items) => Filter::In(column, items.iter().map(Into::into).collect()),
            Self::Number(n) => Filter::Eq(column, number_value(*n)),
            Self::Bool(b) => Filter::Eq(column, (*b).into()),
        }
    }
}

/// Whole numbers bind as integers so they compare equal to INTEGER columns.
#[allow(clippy::cast_possible_truncation)]
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Integer(n as i64)
    } else {
        Value::Real(n)
    }
}

/// Filter, sort and page options accepted by every data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Field filters keyed by camelCase field name.
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    /// Optional ordering.
    #[serde(default)]
    pub sort: Option<Sort>,
    /// Optional page window; sources use [`Pagination::default`] when absent.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl QueryOptions {
    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    /// Set the ordering.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.sort = Some(Sort::new(field, direction));
        self
    }

    /// Set the page window.
    #[must_use]
    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.pagination = Some(Pagination::new(page, limit));
        self
    }

    /// The page window, or the default one.
    #[must_use]
    pub fn pagination_or_default(&self) -> Pagination {
        self.pagination.unwrap_or_default()
    }

    /// Build options from query-string parameters.
    ///
    /// `sort`, `page` and `limit` are reserved; every other parameter is a
    /// filter interpreted by [`FilterValue::from_param`]. Empty values are
    /// ignored.
    #[must_use]
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut options = Self::default();
        for (key, value) in params {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "sort" => options.sort = Sort::parse_param(value),
                "page" | "limit" => {}
                _ => {
                    options
                        .filters
                        .insert(key.clone(), FilterValue::from_param(value));
                }
            }
        }
        if params.contains_key("page") || params.contains_key("limit") {
            let page = parse_u32(params.get("page")).unwrap_or(DEFAULT_PAGE);
            let limit = parse_u32(params.get("limit")).unwrap_or(DEFAULT_LIMIT);
            options.pagination = Some(Pagination::new(page, limit));
        }
        options
    }
}

fn parse_u32(value: Option<&String>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Page metadata returned with every page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Total matching rows across all pages.
    pub total: u64,
    /// This page's number.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
    /// Number of pages, `ceil(total / limit)`.
    pub pages: u64,
}

impl PageInfo {
    /// Compute page metadata.
    #[must_use]
    pub fn new(total: u64, pagination: Pagination) -> Self {
        let limit = u64::from(pagination.limit.max(1));
        Self {
            total,
            page: pagination.page,
            limit: pagination.limit,
            pages: total.div_ceil(limit),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub data: Vec<T>,
    /// Page metadata.
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    /// Wrap rows with page metadata.
    #[must_use]
    pub fn new(data: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            data,
            pagination: PageInfo::new(total, pagination),
        }
    }

    /// Slice a fully materialised, already ordered list into a page.
    #[must_use]
    pub fn from_vec(items: Vec<T>, pagination: Pagination) -> Self {
        let total = items.len() as u64;
        let start = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let data = items
            .into_iter()
            .skip(start)
            .take(pagination.limit as usize)
            .collect();
        Self::new(data, total, pagination)
    }

    /// An empty page, used when a lookup fails.
    #[must_use]
    pub fn empty(pagination: Pagination) -> Self {
        Self::new(Vec::new(), 0, pagination)
    }
}

/// Translate a camelCase field name into its snake_case column.
///
/// ```
/// assert_eq!(toppharma::query::column_name("marketCap"), "market_cap");
/// assert_eq!(toppharma::query::column_name("hasSSL"), "has_ssl");
/// ```
#[must_use]
pub fn column_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    let mut prev_upper = false;
    for c in field.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() && !prev_upper {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_upper = true;
        } else {
            out.push(c);
            prev_upper = false;
        }
    }
    out
}
