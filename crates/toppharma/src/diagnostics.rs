//! Database diagnostics for the admin section and `toppharma db check`.
//!
//! Each check records its own success and error instead of failing the
//! whole report, so a broken table still yields a readable answer.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::storage::schema::DIRECTORY_TABLES;
use crate::storage::Storage;

/// Tables listed by the schema check.
const SCHEMA_SAMPLE: usize = 10;

/// What is configured for reaching the database; never includes secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Database file in use.
    pub database_path: String,
    /// Whether that file exists on disk.
    pub database_exists: bool,
    /// Whether an admin service key is configured.
    pub service_key_provided: bool,
    /// Length of the service key, 0 when absent.
    pub service_key_length: usize,
}

impl Credentials {
    /// Describe the database at `path` and an optional service key.
    #[must_use]
    pub fn describe(path: &Path, service_key: Option<&str>) -> Self {
        Self {
            database_path: path.display().to_string(),
            database_exists: path.exists(),
            service_key_provided: service_key.is_some(),
            service_key_length: service_key.map_or(0, str::len),
        }
    }
}

/// Result of counting the companies table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompaniesCheck {
    /// Whether the count succeeded.
    pub success: bool,
    /// Failure message.
    pub error: Option<String>,
    /// Rows counted, 0 on failure.
    pub count: u64,
}

/// Result of listing the schema's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaCheck {
    /// Whether the listing succeeded.
    pub success: bool,
    /// Failure message.
    pub error: Option<String>,
    /// Up to ten table names.
    pub tables: Vec<String>,
}

/// Result of the privileged check that opens its own connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminCheck {
    /// Whether the check ran and succeeded.
    pub success: bool,
    /// Whether the check ran; it needs a configured service key.
    pub tested: bool,
    /// Failure message.
    pub error: Option<String>,
    /// Rows counted, when the check succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl AdminCheck {
    fn skipped() -> Self {
        Self {
            success: false,
            tested: false,
            error: None,
            count: None,
        }
    }
}

/// The full connection test served by `/api/test-db-connection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    /// The companies check passed, or the admin check ran and passed.
    pub success: bool,
    /// When the test ran.
    pub timestamp: DateTime<Utc>,
    /// Configuration in use.
    pub credentials: Credentials,
    /// Companies table check.
    pub companies: CompaniesCheck,
    /// Schema listing check.
    pub schema: SchemaCheck,
    /// Privileged check.
    pub admin: AdminCheck,
    /// One-line summary.
    pub message: String,
}

impl ConnectionReport {
    /// Run every check against `storage`.
    ///
    /// The admin check runs only when `service_key` is set; it opens a
    /// second connection to the database file, or reuses `storage` when the
    /// database has no file.
    #[must_use]
    pub fn run(storage: &Storage, service_key: Option<&str>) -> Self {
        info!("Testing database connection");
        let credentials = Credentials::describe(storage.path(), service_key);

        let companies = match storage.count_table("companies") {
            Ok(count) => CompaniesCheck {
                success: true,
                error: None,
                count,
            },
            Err(e) => {
                error!("Companies table check failed: {}", e);
                CompaniesCheck {
                    success: false,
                    error: Some(e.to_string()),
                    count: 0,
                }
            }
        };

        let schema = match storage.list_tables() {
            Ok(tables) => SchemaCheck {
                success: true,
                error: None,
                tables: tables.into_iter().take(SCHEMA_SAMPLE).collect(),
            },
            Err(e) => {
                error!("Schema listing failed: {}", e);
                SchemaCheck {
                    success: false,
                    error: Some(e.to_string()),
                    tables: Vec::new(),
                }
            }
        };

        let admin = match service_key {
            Some(_) => admin_check(storage),
            None => {
                warn!("Skipping admin check - no service key configured");
                AdminCheck::skipped()
            }
        };

        Self::from_checks(credentials, companies, schema, admin)
    }

    fn from_checks(
        credentials: Credentials,
        companies: CompaniesCheck,
        schema: SchemaCheck,
        admin: AdminCheck,
    ) -> Self {
        let success = companies.success || (admin.tested && admin.success);
        let message = if success {
            "Database connection successful"
        } else {
            "Database connection failed with both regular and admin checks"
        };
        Self {
            success,
            timestamp: Utc::now(),
            credentials,
            companies,
            schema,
            admin,
            message: message.to_string(),
        }
    }
}

fn admin_check(storage: &Storage) -> AdminCheck {
    let path = storage.path();
    let result = if path.is_file() {
        Storage::open_read_only(path).and_then(|own| own.count_table("companies"))
    } else {
        storage.count_table("companies")
    };
    match result {
        Ok(count) => AdminCheck {
            success: true,
            tested: true,
            error: None,
            count: Some(count),
        },
        Err(e) => {
            error!("Admin check failed: {}", e);
            AdminCheck {
                success: false,
                tested: true,
                error: Some(e.to_string()),
                count: None,
            }
        }
    }
}

/// Table inventory served by `/admin/data-feeds/connection-test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    /// Every query in the report succeeded.
    pub success: bool,
    /// `SQLite` library version.
    pub sqlite_version: String,
    /// Schema version recorded in the metadata table.
    pub schema_version: i32,
    /// All user tables.
    pub tables: Vec<String>,
    /// Row counts of the directory tables.
    pub counts: BTreeMap<String, u64>,
    /// Per-table failures.
    pub errors: BTreeMap<String, String>,
    /// When the report was taken.
    pub timestamp: DateTime<Utc>,
}

impl FeedReport {
    /// Inventory the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the version or table list cannot be read; a
    /// failing table count is recorded in `errors` instead.
    pub fn run(storage: &Storage) -> Result<Self> {
        let sqlite_version = storage.sqlite_version()?;
        let schema_version = storage.schema_version()?;
        let tables = storage.list_tables()?;

        let mut counts = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for table in DIRECTORY_TABLES {
            match storage.count_table(table) {
                Ok(count) => {
                    counts.insert((*table).to_string(), count);
                }
                Err(e) => {
                    error!("Failed to count {}: {}", table, e);
                    errors.insert((*table).to_string(), e.to_string());
                }
            }
        }

        Ok(Self {
            success: errors.is_empty(),
            sqlite_version,
            schema_version,
            tables,
            counts,
            errors,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn seeded() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        storage.import(&Dataset::demo()).unwrap();
        storage
    }

    fn companies(success: bool) -> CompaniesCheck {
        CompaniesCheck {
            success,
            error: (!success).then(|| "no such table: companies".to_string()),
            count: 0,
        }
    }

    fn schema() -> SchemaCheck {
        SchemaCheck {
            success: true,
            error: None,
            tables: Vec::new(),
        }
    }

    fn credentials() -> Credentials {
        Credentials::describe(Path::new(":memory:"), None)
    }

    #[test]
    fn test_connection_report_without_service_key() {
        let report = ConnectionReport::run(&seeded(), None);
        assert!(report.success);
        assert_eq!(report.companies.count, 4);
        assert!(report.schema.tables.contains(&"companies".to_string()));
        assert!(report.schema.tables.len() <= SCHEMA_SAMPLE);
        assert!(!report.admin.tested);
        assert!(!report.credentials.service_key_provided);
        assert_eq!(report.message, "Database connection successful");
    }

    #[test]
    fn test_connection_report_with_service_key() {
        let report = ConnectionReport::run(&seeded(), Some("secret-key"));
        assert!(report.admin.tested);
        assert!(report.admin.success);
        assert_eq!(report.admin.count, Some(4));
        assert_eq!(report.credentials.service_key_length, 10);
    }

    #[test]
    fn test_admin_check_opens_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("directory.db")).unwrap();
        storage.import(&Dataset::demo()).unwrap();

        let report = ConnectionReport::run(&storage, Some("key"));
        assert!(report.credentials.database_exists);
        assert_eq!(report.admin.count, Some(4));
    }

    #[test]
    fn test_success_rule() {
        let admin_ok = AdminCheck {
            success: true,
            tested: true,
            error: None,
            count: Some(1),
        };
        let report =
            ConnectionReport::from_checks(credentials(), companies(false), schema(), admin_ok);
        assert!(report.success);

        let report = ConnectionReport::from_checks(
            credentials(),
            companies(false),
            schema(),
            AdminCheck::skipped(),
        );
        assert!(!report.success);
        assert!(report.message.contains("failed"));

        let report = ConnectionReport::from_checks(
            credentials(),
            companies(true),
            schema(),
            AdminCheck::skipped(),
        );
        assert!(report.success);
    }

    #[test]
    fn test_feed_report() {
        let report = FeedReport::run(&seeded()).unwrap();
        assert!(report.success);
        assert_eq!(report.counts["companies"], 4);
        assert_eq!(report.counts["products"], 10);
        assert_eq!(report.counts["therapeutic_areas"], 5);
        assert_eq!(report.counts["websites"], 5);
        assert!(report.tables.contains(&"product_websites".to_string()));
        assert!(!report.sqlite_version.is_empty());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ConnectionReport::run(&seeded(), None);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["credentials"]["databasePath"].is_string());
        assert!(json["admin"].get("count").is_none());
    }

    #[test]
    fn test_admin_check_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.db");
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE companies (id TEXT PRIMARY KEY);
                 INSERT INTO companies VALUES ('pfizer'), ('merck');",
            )
            .unwrap();
        }
        let before = std::fs::read(&path).unwrap();

        let storage = Storage::open_read_only(&path).unwrap();
        let check = admin_check(&storage);
        drop(storage);

        assert!(check.success);
        assert_eq!(check.count, Some(2));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert!(!dir.path().join("plain.db-wal").exists());
    }

    #[test]
    fn test_open_read_only_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Storage::open_read_only(dir.path().join("missing.db")).is_err());
        assert!(!dir.path().join("missing.db").exists());
    }
}
