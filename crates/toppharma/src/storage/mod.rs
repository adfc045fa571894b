//! Storage layer for toppharma.
//!
//! This module provides the `SQLite`-backed relational store behind the
//! directory: typed selects built with [`Select`], join-table reads for
//! application-level joins, inserts for seeding, and the introspection the
//! admin diagnostics report.

pub mod migrations;
pub mod schema;

use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::model::TableRow;
use crate::query::Select;

/// A many-to-many relation stored in a join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Companies and the therapeutic areas they work in.
    CompanyTherapeuticArea,
    /// Products and the therapeutic areas they treat.
    ProductTherapeuticArea,
    /// Products and the websites that feature them.
    ProductWebsite,
}

impl Relation {
    /// All relations.
    pub const ALL: [Self; 3] = [
        Self::CompanyTherapeuticArea,
        Self::ProductTherapeuticArea,
        Self::ProductWebsite,
    ];

    /// Join table name.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::CompanyTherapeuticArea => "company_therapeutic_areas",
            Self::ProductTherapeuticArea => "product_therapeutic_areas",
            Self::ProductWebsite => "product_websites",
        }
    }

    /// Column holding the left-hand id.
    #[must_use]
    pub fn left_column(self) -> &'static str {
        match self {
            Self::CompanyTherapeuticArea => "company_id",
            Self::ProductTherapeuticArea | Self::ProductWebsite => "product_id",
        }
    }

    /// Column holding the right-hand id.
    #[must_use]
    pub fn right_column(self) -> &'static str {
        match self {
            Self::CompanyTherapeuticArea | Self::ProductTherapeuticArea => "therapeutic_area_id",
            Self::ProductWebsite => "website_id",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Which side of a relation a lookup filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The company or product side.
    Left,
    /// The therapeutic area or website side.
    Right,
}

/// One row of a join table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    /// Left-hand id (company or product).
    pub left: String,
    /// Right-hand id (therapeutic area or website).
    pub right: String,
}

impl Link {
    /// Create a link.
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Storage engine for the directory.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist
    /// and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Open an existing database file for reading only.
    ///
    /// Unlike [`Storage::open`] this neither creates directories, changes
    /// the journal mode nor runs migrations; the file is left as found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening database read-only at {}", path.display());
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a select and map every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid or the database operation fails.
    pub fn select<R: TableRow>(&self, query: &Select) -> Result<Vec<R>> {
        let (sql, values) = query.build()?;
        debug!(table = query.table_name(), %sql, "select");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| R::from_sql(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Run a select and return the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid or the database operation fails.
    pub fn first<R: TableRow>(&self, query: Select) -> Result<Option<R>> {
        let (sql, values) = query.limit(1).build()?;
        let row = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| R::from_sql(row))
            .optional()?;
        Ok(row)
    }

    /// Count the rows a select would match, ignoring its order and range.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid or the database operation fails.
    pub fn count(&self, query: &Select) -> Result<u64> {
        let (sql, values) = query.build_count()?;
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Every row of a join table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn links(&self, relation: Relation) -> Result<Vec<Link>> {
        let sql = format!(
            "SELECT {}, {} FROM {}",
            relation.left_column(),
            relation.right_column(),
            relation.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map([], Self::row_to_link)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Join rows whose `side` id is one of `ids`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn links_for(&self, relation: Relation, side: Side, ids: &[String]) -> Result<Vec<Link>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let column = match side {
            Side::Left => relation.left_column(),
            Side::Right => relation.right_column(),
        };
        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT {}, {} FROM {} WHERE {column} IN ({})",
            relation.left_column(),
            relation.right_column(),
            relation.table(),
            placeholders.join(", ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map(params_from_iter(ids.iter()), Self::row_to_link)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Insert or replace one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert<R: TableRow>(&self, row: &R) -> Result<()> {
        let values = row.values();
        if values.len() != R::COLUMNS.len() {
            return Err(Error::internal(format!(
                "{} row has {} values for {} columns",
                R::TABLE,
                values.len(),
                R::COLUMNS.len()
            )));
        }
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            R::TABLE,
            R::COLUMNS.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Relate two ids. Linking an existing pair is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when
    /// either id does not exist.
    pub fn link(&self, relation: Relation, left: &str, right: &str) -> Result<()> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
            relation.table(),
            relation.left_column(),
            relation.right_column()
        );
        self.conn.execute(&sql, params![left, right])?;
        Ok(())
    }

    /// Load a whole dataset in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn import(&self, dataset: &Dataset) -> Result<ImportSummary> {
        let tx = self.conn.unchecked_transaction()?;

        for area in &dataset.therapeutic_areas {
            self.insert(&area.to_row())?;
        }
        for company in &dataset.companies {
            self.insert(&company.to_row())?;
        }
        for product in &dataset.products {
            self.insert(&product.to_row())?;
        }
        for website in &dataset.websites {
            self.insert(&website.to_row())?;
        }

        let mut links = 0;
        for relation in Relation::ALL {
            for link in dataset.links(relation) {
                self.link(relation, &link.left, &link.right)?;
                links += 1;
            }
        }

        tx.commit()?;

        let summary = ImportSummary {
            companies: dataset.companies.len(),
            products: dataset.products.len(),
            websites: dataset.websites.len(),
            therapeutic_areas: dataset.therapeutic_areas.len(),
            links,
        };
        info!(?summary, "Imported dataset");
        Ok(summary)
    }

    /// Count every row in a known table.
    ///
    /// # Errors
    ///
    /// Returns an error for tables outside the directory schema or if the
    /// database operation fails.
    pub fn count_table(&self, table: &str) -> Result<u64> {
        let known = schema::DIRECTORY_TABLES.contains(&table)
            || Relation::ALL.iter().any(|r| r.table() == table);
        if !known {
            return Err(Error::invalid_query(format!("unknown table: {table}")));
        }
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Names of the user tables in the database, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// The `SQLite` library version.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn sqlite_version(&self) -> Result<String> {
        let version = self
            .conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        Ok(version)
    }

    /// The current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata table cannot be read.
    pub fn schema_version(&self) -> Result<i32> {
        migrations::schema_version(&self.conn)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let mut links = 0;
        for relation in Relation::ALL {
            links += self.count_table(relation.table())?;
        }

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            companies: self.count_table("companies")?,
            products: self.count_table("products")?,
            websites: self.count_table("websites")?,
            therapeutic_areas: self.count_table("therapeutic_areas")?,
            links,
            schema_version: self.schema_version()?,
            db_size_bytes,
        })
    }

    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<Link> {
        Ok(Link {
            left: row.get(0)?,
            right: row.get(1)?,
        })
    }
}

/// Counts written by [`Storage::import`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Companies written.
    pub companies: usize,
    /// Products written.
    pub products: usize,
    /// Websites written.
    pub websites: usize,
    /// Therapeutic areas written.
    pub therapeutic_areas: usize,
    /// Join rows written.
    pub links: usize,
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of companies.
    pub companies: u64,
    /// Number of products.
    pub products: u64,
    /// Number of websites.
    pub websites: u64,
    /// Number of therapeutic areas.
    pub therapeutic_areas: u64,
    /// Rows across all join tables.
    pub links: u64,
    /// Schema version.
    pub schema_version: i32,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
