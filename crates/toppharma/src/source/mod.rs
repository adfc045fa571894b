//! Data sources for the directory.
//!
//! A [`DataSource`] answers entity lookups and paged list queries driven by
//! [`QueryOptions`]. Two implementations exist: [`DatabaseSource`] reads the
//! `SQLite` store and [`MockSource`] serves the built-in demo catalog from
//! memory. [`SourceRegistry`] holds the registered sources and tracks which
//! one is active.

mod database;
mod mock;
mod registry;

pub use database::{run_blocking, DatabaseSource, SharedStorage};
pub use mock::MockSource;
pub use registry::SourceRegistry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Company, Product, TherapeuticArea, Website};
use crate::query::{Page, QueryOptions};

/// The kinds of data source the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// In-memory demo catalog.
    Mock,
    /// The `SQLite` database.
    Database,
}

impl SourceKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 2] = [Self::Mock, Self::Database];

    /// Lowercase name used in config, URLs and cookies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Database => "database",
        }
    }

    /// The other kind; used by the data-source toggle.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Mock => Self::Database,
            Self::Database => Self::Mock,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "database" | "db" | "sqlite" => Ok(Self::Database),
            other => Err(Error::UnknownSource(other.to_string())),
        }
    }
}

/// Read access to the directory entities.
///
/// List methods take [`QueryOptions`] whose filter and sort fields are the
/// camelCase names the API exposes. `*_by_id` lookups return `Ok(None)`
/// when nothing matches.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Which kind of source this is.
    fn kind(&self) -> SourceKind;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether the backing store answers queries.
    async fn health_check(&self) -> bool;

    /// Look up one company.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn company_by_id(&self, id: &str) -> Result<Option<Company>>;

    /// A page of companies.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort fields, or if the
    /// backing store fails.
    async fn companies(&self, options: &QueryOptions) -> Result<Page<Company>>;

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn product_by_id(&self, id: &str) -> Result<Option<Product>>;

    /// A page of products.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort fields, or if the
    /// backing store fails.
    async fn products(&self, options: &QueryOptions) -> Result<Page<Product>>;

    /// A page of one company's products.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort fields, or if the
    /// backing store fails.
    async fn products_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<Product>>;

    /// Look up one website.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn website_by_id(&self, id: &str) -> Result<Option<Website>>;

    /// A page of websites.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort fields, or if the
    /// backing store fails.
    async fn websites(&self, options: &QueryOptions) -> Result<Page<Website>>;

    /// A page of one company's websites.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort fields, or if the
    /// backing store fails.
    async fn websites_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<Website>>;

    /// Look up one therapeutic area.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    async fn therapeutic_area_by_id(&self, id: &str) -> Result<Option<TherapeuticArea>>;

    /// A page of therapeutic areas.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort fields, or if the
    /// backing store fails.
    async fn therapeutic_areas(&self, options: &QueryOptions) -> Result<Page<TherapeuticArea>>;

    /// A page of the therapeutic areas one company works in.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort fields, or if the
    /// backing store fails.
    async fn therapeutic_areas_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<TherapeuticArea>>;
}
