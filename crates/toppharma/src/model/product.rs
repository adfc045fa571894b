//! Products and development stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{non_empty, non_zero, TableRow};
use crate::query::Value;

/// Development stage of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStage {
    /// Target discovery.
    Discovery,
    /// Preclinical research.
    Preclinical,
    /// Phase 1 trials.
    Phase1,
    /// Phase 2 trials.
    Phase2,
    /// Phase 3 trials.
    Phase3,
    /// Approved, not yet launched.
    Approved,
    /// On the market.
    Market,
    /// Development stopped.
    Discontinued,
}

impl ProductStage {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 8] = [
        Self::Discovery,
        Self::Preclinical,
        Self::Phase1,
        Self::Phase2,
        Self::Phase3,
        Self::Approved,
        Self::Market,
        Self::Discontinued,
    ];

    /// The value stored in the `stage` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Preclinical => "preclinical",
            Self::Phase1 => "phase1",
            Self::Phase2 => "phase2",
            Self::Phase3 => "phase3",
            Self::Approved => "approved",
            Self::Market => "market",
            Self::Discontinued => "discontinued",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Discovery => "Discovery",
            Self::Preclinical => "Preclinical",
            Self::Phase1 => "Phase 1",
            Self::Phase2 => "Phase 2",
            Self::Phase3 => "Phase 3",
            Self::Approved => "Approved",
            Self::Market => "On Market",
            Self::Discontinued => "Discontinued",
        }
    }
}

impl fmt::Display for ProductStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown product stage: {s}"))
    }
}

/// A row of the `products` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    /// Primary key.
    pub id: String,
    /// Brand name.
    pub name: String,
    /// URL slug.
    pub slug: Option<String>,
    /// International non-proprietary name.
    pub generic_name: Option<String>,
    /// Owning company.
    pub company_id: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Regulatory status text.
    pub status: Option<String>,
    /// Development stage, see [`ProductStage`].
    pub stage: Option<String>,
    /// Approval or launch year.
    pub year: Option<i64>,
    /// Small molecule, biologic, vaccine, ...
    pub molecule_type: Option<String>,
    /// Product image URL.
    pub image_url: Option<String>,
    /// Product website URL.
    pub website: Option<String>,
    /// Approved indications as a JSON array of strings.
    pub indications: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
}

/// A product as served by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Primary key.
    pub id: String,
    /// Brand name.
    pub name: String,
    /// URL slug; empty when none is stored.
    pub slug: String,
    /// International non-proprietary name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
    /// Owning company.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Regulatory status text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Development stage, see [`ProductStage`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Approval or launch year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    /// Small molecule, biologic, vaccine, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub molecule_type: Option<String>,
    /// Product image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Product website URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Creation timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Ids of the linked therapeutic areas.
    #[serde(default)]
    pub therapeutic_areas: Vec<String>,
    /// Approved indications.
    #[serde(default)]
    pub indications: Vec<String>,
}

impl Product {
    /// The parsed development stage, if the stored value is known.
    #[must_use]
    pub fn stage(&self) -> Option<ProductStage> {
        self.stage.as_deref().and_then(|s| s.parse().ok())
    }

    /// Convert back into a table row for inserts.
    #[must_use]
    pub fn to_row(&self) -> ProductRow {
        let indications = if self.indications.is_empty() {
            None
        } else {
            serde_json::to_string(&self.indications).ok()
        };
        ProductRow {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: Some(self.slug.clone()).filter(|s| !s.is_empty()),
            generic_name: self.generic_name.clone(),
            company_id: self.company_id.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            stage: self.stage.clone(),
            year: self.year,
            molecule_type: self.molecule_type.clone(),
            image_url: self.image_url.clone(),
            website: self.website.clone(),
            indications,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let indications = row
            .indications
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default();
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug.unwrap_or_default(),
            generic_name: non_empty(row.generic_name),
            company_id: non_empty(row.company_id),
            description: non_empty(row.description),
            status: non_empty(row.status),
            stage: non_empty(row.stage),
            year: non_zero(row.year),
            molecule_type: non_empty(row.molecule_type),
            image_url: non_empty(row.image_url),
            website: non_empty(row.website),
            created_at: non_empty(row.created_at),
            updated_at: non_empty(row.updated_at),
            therapeutic_areas: Vec::new(),
            indications,
        }
    }
}

impl TableRow for ProductRow {
    const TABLE: &'static str = "products";

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "slug",
        "generic_name",
        "company_id",
        "description",
        "status",
        "stage",
        "year",
        "molecule_type",
        "image_url",
        "website",
        "indications",
        "created_at",
        "updated_at",
    ];

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            generic_name: row.get("generic_name")?,
            company_id: row.get("company_id")?,
            description: row.get("description")?,
            status: row.get("status")?,
            stage: row.get("stage")?,
            year: row.get("year")?,
            molecule_type: row.get("molecule_type")?,
            image_url: row.get("image_url")?,
            website: row.get("website")?,
            indications: row.get("indications")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.clone().into(),
            self.name.clone().into(),
            self.slug.clone().into(),
            self.generic_name.clone().into(),
            self.company_id.clone().into(),
            self.description.clone().into(),
            self.status.clone().into(),
            self.stage.clone().into(),
            self.year.into(),
            self.molecule_type.clone().into(),
            self.image_url.clone().into(),
            self.website.clone().into(),
            self.indications.clone().into(),
            self.created_at.clone().into(),
            self.updated_at.clone().into(),
        ]
    }
}
