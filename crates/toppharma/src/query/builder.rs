//! Parameterised SELECT builder.
//!
//! Page handlers assemble queries by conditionally appending filters, one
//! ordering and an optional range. Column names are checked against the
//! table's known columns when the statement is built, so request input never
//! reaches the SQL text; all values travel as bound parameters.

use rusqlite::types::{ToSql, ToSqlOutput};

use super::Direction;
use crate::error::{Error, Result};
use crate::model::TableRow;

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// Text.
    Text(String),
    /// Integer.
    Integer(i64),
    /// Floating point.
    Real(f64),
    /// Boolean, stored as 0/1.
    Bool(bool),
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Null => Ok(ToSqlOutput::from(rusqlite::types::Null)),
            Self::Text(s) => s.to_sql(),
            Self::Integer(i) => i.to_sql(),
            Self::Real(f) => f.to_sql(),
            Self::Bool(b) => b.to_sql(),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column <> value`
    Neq(String, Value),
    /// Case-insensitive `LIKE` with `%` wildcards supplied by the caller.
    ILike(String, String),
    /// Any of the columns matches the pattern (an OR of `ILike`s).
    AnyILike(Vec<String>, String),
    /// `column IN (...)`; an empty list matches nothing.
    In(String, Vec<Value>),
    /// `column >= value`
    Gte(String, Value),
    /// `column <= value`
    Lte(String, Value),
}

impl Filter {
    fn columns(&self) -> Vec<&str> {
        match self {
            Self::Eq(c, _)
            | Self::Neq(c, _)
            | Self::ILike(c, _)
            | Self::In(c, _)
            | Self::Gte(c, _)
            | Self::Lte(c, _) => vec![c.as_str()],
            Self::AnyILike(cols, _) => cols.iter().map(String::as_str).collect(),
        }
    }

    fn push_sql(&self, sql: &mut Vec<String>, params: &mut Vec<Value>) {
        let clause = match self {
            Self::Eq(c, v) => format!("{c} = {}", bind(params, v.clone())),
            Self::Neq(c, v) => format!("{c} <> {}", bind(params, v.clone())),
            Self::ILike(c, p) => format!("{c} LIKE {}", bind(params, p.clone().into())),
            Self::AnyILike(cols, p) => {
                let placeholder = bind(params, p.clone().into());
                let parts: Vec<String> = cols
                    .iter()
                    .map(|c| format!("{c} LIKE {placeholder}"))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            Self::In(_, values) if values.is_empty() => "0".to_string(),
            Self::In(c, values) => {
                let placeholders: Vec<String> =
                    values.iter().map(|v| bind(params, v.clone())).collect();
                format!("{c} IN ({})", placeholders.join(", "))
            }
            Self::Gte(c, v) => format!("{c} >= {}", bind(params, v.clone())),
            Self::Lte(c, v) => format!("{c} <= {}", bind(params, v.clone())),
        };
        sql.push(clause);
    }
}

/// Push a parameter and return its numbered placeholder.
fn bind(params: &mut Vec<Value>, value: Value) -> String {
    params.push(value);
    format!("?{}", params.len())
}

/// A SELECT over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: &'static str,
    columns: &'static [&'static str],
    filters: Vec<Filter>,
    order: Option<(String, Direction)>,
    limit: Option<u64>,
    range: Option<(u64, u64)>,
}

impl Select {
    /// Start a query over the table of row type `R`.
    #[must_use]
    pub fn from<R: TableRow>() -> Self {
        Self::table(R::TABLE, R::COLUMNS)
    }

    /// Start a query over an explicit table and column list.
    #[must_use]
    pub fn table(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            table,
            columns,
            filters: Vec::new(),
            order: None,
            limit: None,
            range: None,
        }
    }

    /// The table this query reads.
    #[must_use]
    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// Add an arbitrary filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(column.to_string(), value.into()))
    }

    /// `column <> value`
    #[must_use]
    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Neq(column.to_string(), value.into()))
    }

    /// Case-insensitive pattern match.
    #[must_use]
    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(Filter::ILike(column.to_string(), pattern.into()))
    }

    /// Match the pattern against any of `columns`.
    #[must_use]
    pub fn or_ilike(self, columns: &[&str], pattern: impl Into<String>) -> Self {
        let columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.filter(Filter::AnyILike(columns, pattern.into()))
    }

    /// `column IN (values)`
    #[must_use]
    pub fn in_list<V, I>(self, column: &str, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(Filter::In(column.to_string(), values))
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gte(column.to_string(), value.into()))
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lte(column.to_string(), value.into()))
    }

    /// Order by one column. A later call replaces an earlier one.
    #[must_use]
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some((column.to_string(), direction));
        self
    }

    /// Return at most `n` rows.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Return rows `start..=end` (zero-based, inclusive). Overrides `limit`.
    #[must_use]
    pub fn range(mut self, start: u64, end: u64) -> Self {
        self.range = Some((start, end));
        self
    }

    fn check_column(&self, column: &str) -> Result<()> {
        if self.columns.contains(&column) {
            Ok(())
        } else {
            Err(Error::unknown_column(self.table, column))
        }
    }

    fn where_clause(&self) -> Result<(String, Vec<Value>)> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for filter in &self.filters {
            for column in filter.columns() {
                self.check_column(column)?;
            }
            filter.push_sql(&mut clauses, &mut params);
        }
        if clauses.is_empty() {
            Ok((String::new(), params))
        } else {
            Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
        }
    }

    /// Compile to SQL and its parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown columns or an inverted range.
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        let (where_sql, params) = self.where_clause()?;
        let mut sql = format!("SELECT * FROM {}{where_sql}", self.table);

        if let Some((column, direction)) = &self.order {
            self.check_column(column)?;
            // NULLs sort last in both directions.
            sql.push_str(&format!(
                " ORDER BY {column} IS NULL, {column} {}",
                direction.as_sql()
            ));
        }

        match (self.range, self.limit) {
            (Some((start, end)), _) => {
                if end < start {
                    return Err(Error::invalid_query(format!(
                        "range end {end} is before start {start}"
                    )));
                }
                sql.push_str(&format!(" LIMIT {} OFFSET {start}", end - start + 1));
            }
            (None, Some(n)) => sql.push_str(&format!(" LIMIT {n}")),
            (None, None) => {}
        }

        Ok((sql, params))
    }

    /// Compile the matching `COUNT(*)` statement, ignoring order and range.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown columns.
    pub fn build_count(&self) -> Result<(String, Vec<Value>)> {
        let (where_sql, params) = self.where_clause()?;
        Ok((format!("SELECT COUNT(*) FROM {}{where_sql}", self.table), params))
    }
}
