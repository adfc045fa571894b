//! `SQLite` schema definitions for toppharma.
//!
//! This module contains the SQL statements for creating the directory
//! tables and the join tables that relate them.

/// SQL statement to create the companies table.
pub const CREATE_COMPANIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT,
    description TEXT,
    logo_url TEXT,
    header_image_url TEXT,
    website TEXT,
    headquarters TEXT,
    founded INTEGER,
    employees INTEGER,
    market_cap REAL,
    ticker_symbol TEXT,
    stock_exchange TEXT,
    ownership_type TEXT,
    parent_company_id TEXT,
    created_at TEXT,
    updated_at TEXT
)
";

/// SQL statement to create the products table.
pub const CREATE_PRODUCTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT,
    generic_name TEXT,
    company_id TEXT REFERENCES companies(id) ON DELETE SET NULL,
    description TEXT,
    status TEXT,
    stage TEXT,
    year INTEGER,
    molecule_type TEXT,
    image_url TEXT,
    website TEXT,
    indications TEXT,
    created_at TEXT,
    updated_at TEXT
)
";

/// SQL statement to create the websites table.
pub const CREATE_WEBSITES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS websites (
    id TEXT PRIMARY KEY,
    slug TEXT,
    domain TEXT NOT NULL,
    site_name TEXT,
    category TEXT,
    description TEXT,
    company_id TEXT REFERENCES companies(id) ON DELETE SET NULL,
    url TEXT,
    has_ssl INTEGER,
    status TEXT,
    screenshot_url TEXT,
    screenshot_date TEXT,
    last_crawl TEXT,
    last_updated TEXT,
    created_at TEXT,
    updated_at TEXT
)
";

/// SQL statement to create the therapeutic areas table.
pub const CREATE_THERAPEUTIC_AREAS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS therapeutic_areas (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT,
    description TEXT,
    icon_path TEXT,
    created_at TEXT,
    updated_at TEXT
)
";

/// SQL statement to create the company to therapeutic area join table.
pub const CREATE_COMPANY_AREAS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS company_therapeutic_areas (
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    therapeutic_area_id TEXT NOT NULL REFERENCES therapeutic_areas(id) ON DELETE CASCADE,
    PRIMARY KEY (company_id, therapeutic_area_id)
)
";

/// SQL statement to create the product to therapeutic area join table.
pub const CREATE_PRODUCT_AREAS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS product_therapeutic_areas (
    product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    therapeutic_area_id TEXT NOT NULL REFERENCES therapeutic_areas(id) ON DELETE CASCADE,
    PRIMARY KEY (product_id, therapeutic_area_id)
)
";

/// SQL statement to create the product to website join table.
pub const CREATE_PRODUCT_WEBSITES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS product_websites (
    product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    website_id TEXT NOT NULL REFERENCES websites(id) ON DELETE CASCADE,
    PRIMARY KEY (product_id, website_id)
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_COMPANIES_TABLE,
    CREATE_PRODUCTS_TABLE,
    CREATE_WEBSITES_TABLE,
    CREATE_THERAPEUTIC_AREAS_TABLE,
    CREATE_COMPANY_AREAS_TABLE,
    CREATE_PRODUCT_AREAS_TABLE,
    CREATE_PRODUCT_WEBSITES_TABLE,
    CREATE_METADATA_TABLE,
];

/// Lookup indexes added in schema version 2.
pub const LOOKUP_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_companies_slug ON companies(slug)",
    "CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name)",
    "CREATE INDEX IF NOT EXISTS idx_products_slug ON products(slug)",
    "CREATE INDEX IF NOT EXISTS idx_products_company ON products(company_id)",
    "CREATE INDEX IF NOT EXISTS idx_websites_slug ON websites(slug)",
    "CREATE INDEX IF NOT EXISTS idx_websites_company ON websites(company_id)",
    "CREATE INDEX IF NOT EXISTS idx_therapeutic_areas_slug ON therapeutic_areas(slug)",
    "CREATE INDEX IF NOT EXISTS idx_company_areas_area ON company_therapeutic_areas(therapeutic_area_id)",
    "CREATE INDEX IF NOT EXISTS idx_product_areas_area ON product_therapeutic_areas(therapeutic_area_id)",
];

/// Directory tables reported by diagnostics, in display order.
pub const DIRECTORY_TABLES: &[&str] = &[
    "companies",
    "products",
    "therapeutic_areas",
    "websites",
];
