//! Directory entities and their row mappings.
//!
//! Each entity comes in two shapes: a `*Row` struct that mirrors the
//! snake_case database columns one to one, and a camelCase record that the
//! API serves. Converting a row into a record drops empty optional values
//! so they are omitted from JSON rather than sent as `""`, `0` or `null`.

mod company;
mod product;
mod therapeutic_area;
mod website;

pub use company::{Company, CompanyRow};
pub use product::{Product, ProductRow, ProductStage};
pub use therapeutic_area::{TherapeuticArea, TherapeuticAreaRow};
pub use website::{Website, WebsiteRow};

use crate::query::Value;

/// A struct that maps to one row of a directory table.
pub trait TableRow: Sized {
    /// Table the row lives in.
    const TABLE: &'static str;

    /// Every column of the table, in insert order.
    const COLUMNS: &'static [&'static str];

    /// Read a row selected with `SELECT *`.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has the wrong type.
    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;

    /// Column values in the order of [`TableRow::COLUMNS`].
    fn values(&self) -> Vec<Value>;
}

/// Keep a string only when it has content.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Keep an integer only when it is non-zero.
pub(crate) fn non_zero(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

/// Keep a float only when it is non-zero.
pub(crate) fn non_zero_f64(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("x".into())), Some("x".to_string()));
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_non_zero() {
        assert_eq!(non_zero(Some(1849)), Some(1849));
        assert_eq!(non_zero(Some(0)), None);
        assert_eq!(non_zero_f64(Some(0.0)), None);
        assert_eq!(non_zero_f64(Some(245.3)), Some(245.3));
    }

    #[test]
    fn test_columns_match_values() {
        assert_eq!(
            CompanyRow::COLUMNS.len(),
            CompanyRow::default().values().len()
        );
        assert_eq!(
            ProductRow::COLUMNS.len(),
            ProductRow::default().values().len()
        );
        assert_eq!(
            WebsiteRow::COLUMNS.len(),
            WebsiteRow::default().values().len()
        );
        assert_eq!(
            TherapeuticAreaRow::COLUMNS.len(),
            TherapeuticAreaRow::default().values().len()
        );
    }
}
