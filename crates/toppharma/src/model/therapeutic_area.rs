//! Therapeutic areas: the disease categories companies and products are tagged with.

use serde::{Deserialize, Serialize};

use super::{non_empty, TableRow};
use crate::query::Value;

/// A row of the `therapeutic_areas` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticAreaRow {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Icon asset path.
    pub icon_path: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
}

/// A therapeutic area as served by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapeuticArea {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug; empty when none is stored.
    pub slug: String,
    /// Free-text description.
    pub description: String,
    /// Icon asset path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
    /// Creation timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<TherapeuticAreaRow> for TherapeuticArea {
    fn from(row: TherapeuticAreaRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            icon_path: non_empty(row.icon_path),
            created_at: non_empty(row.created_at),
            updated_at: non_empty(row.updated_at),
        }
    }
}

impl TherapeuticArea {
    /// Convert back into a table row for inserts.
    #[must_use]
    pub fn to_row(&self) -> TherapeuticAreaRow {
        TherapeuticAreaRow {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: Some(self.slug.clone()).filter(|s| !s.is_empty()),
            description: Some(self.description.clone()).filter(|s| !s.is_empty()),
            icon_path: self.icon_path.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

impl TableRow for TherapeuticAreaRow {
    const TABLE: &'static str = "therapeutic_areas";

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "slug",
        "description",
        "icon_path",
        "created_at",
        "updated_at",
    ];

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            description: row.get("description")?,
            icon_path: row.get("icon_path")?,
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
            self.icon_path.clone().into(),
            self.created_at.clone().into(),
            self.updated_at.clone().into(),
        ]
    }
}
