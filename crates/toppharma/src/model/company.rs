//! Companies.

use serde::{Deserialize, Serialize};

use super::{non_empty, non_zero, non_zero_f64, TableRow};
use crate::query::Value;

/// A row of the `companies` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRow {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Logo image URL.
    pub logo_url: Option<String>,
    /// Header image URL.
    pub header_image_url: Option<String>,
    /// Corporate website URL.
    pub website: Option<String>,
    /// Headquarters location or region.
    pub headquarters: Option<String>,
    /// Year founded.
    pub founded: Option<i64>,
    /// Employee headcount.
    pub employees: Option<i64>,
    /// Market capitalisation in billions of USD.
    pub market_cap: Option<f64>,
    /// Stock ticker.
    pub ticker_symbol: Option<String>,
    /// Exchange the ticker trades on.
    pub stock_exchange: Option<String>,
    /// Public, private, subsidiary, ...
    pub ownership_type: Option<String>,
    /// Parent company id for subsidiaries.
    pub parent_company_id: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
}

/// A company as served by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug; empty when none is stored.
    pub slug: String,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Logo image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Header image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_image_url: Option<String>,
    /// Corporate website URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Headquarters location or region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
    /// Year founded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded: Option<i64>,
    /// Employee headcount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<i64>,
    /// Market capitalisation in billions of USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    /// Stock ticker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker_symbol: Option<String>,
    /// Exchange the ticker trades on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_exchange: Option<String>,
    /// Public, private, subsidiary, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership_type: Option<String>,
    /// Parent company id for subsidiaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_company_id: Option<String>,
    /// Creation timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Ids of the company's therapeutic areas, filled from the join table.
    #[serde(default)]
    pub therapeutic_areas: Vec<String>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug.unwrap_or_default(),
            description: non_empty(row.description),
            logo_url: non_empty(row.logo_url),
            header_image_url: non_empty(row.header_image_url),
            website: non_empty(row.website),
            headquarters: non_empty(row.headquarters),
            founded: non_zero(row.founded),
            employees: non_zero(row.employees),
            market_cap: non_zero_f64(row.market_cap),
            ticker_symbol: non_empty(row.ticker_symbol),
            stock_exchange: non_empty(row.stock_exchange),
            ownership_type: non_empty(row.ownership_type),
            parent_company_id: non_empty(row.parent_company_id),
            created_at: non_empty(row.created_at),
            updated_at: non_empty(row.updated_at),
            therapeutic_areas: Vec::new(),
        }
    }
}

impl Company {
    /// Convert back into a table row for inserts.
    #[must_use]
    pub fn to_row(&self) -> CompanyRow {
        CompanyRow {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: Some(self.slug.clone()).filter(|s| !s.is_empty()),
            description: self.description.clone(),
            logo_url: self.logo_url.clone(),
            header_image_url: self.header_image_url.clone(),
            website: self.website.clone(),
            headquarters: self.headquarters.clone(),
            founded: self.founded,
            employees: self.employees,
            market_cap: self.market_cap,
            ticker_symbol: self.ticker_symbol.clone(),
            stock_exchange: self.stock_exchange.clone(),
            ownership_type: self.ownership_type.clone(),
            parent_company_id: self.parent_company_id.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

impl TableRow for CompanyRow {
    const TABLE: &'static str = "companies";

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "slug",
        "description",
        "logo_url",
        "header_image_url",
        "website",
        "headquarters",
        "founded",
        "employees",
        "market_cap",
        "ticker_symbol",
        "stock_exchange",
        "ownership_type",
        "parent_company_id",
        "created_at",
        "updated_at",
    ];

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            description: row.get("description")?,
            logo_url: row.get("logo_url")?,
            header_image_url: row.get("header_image_url")?,
            website: row.get("website")?,
            headquarters: row.get("headquarters")?,
            founded: row.get("founded")?,
            employees: row.get("employees")?,
            market_cap: row.get("market_cap")?,
            ticker_symbol: row.get("ticker_symbol")?,
            stock_exchange: row.get("stock_exchange")?,
            ownership_type: row.get("ownership_type")?,
            parent_company_id: row.get("parent_company_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.clone().into(),
            self.name.clone().into(),
            self.slug.clone().into(),
            self.description.clone().into(),
            self.logo_url.clone().into(),
            self.header_image_url.clone().into(),
            self.website.clone().into(),
            self.headquarters.clone().into(),
            self.founded.into(),
            self.employees.into(),
            self.market_cap.into(),
            self.ticker_symbol.clone().into(),
            self.stock_exchange.clone().into(),
            self.ownership_type.clone().into(),
            self.parent_company_id.clone().into(),
            self.created_at.clone().into(),
            self.updated_at.clone().into(),
        ]
    }
}
