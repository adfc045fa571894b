//! Websites run by companies.

use serde::{Deserialize, Serialize};

use super::{non_empty, TableRow};
use crate::query::Value;

/// A row of the `websites` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteRow {
    /// Primary key.
    pub id: String,
    /// URL slug.
    pub slug: Option<String>,
    /// Domain name, e.g. `pfizer.com`.
    pub domain: String,
    /// Site title.
    pub site_name: Option<String>,
    /// Site type: corporate, product, research, disease, patient, news, other.
    pub category: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Owning company.
    pub company_id: Option<String>,
    /// Full URL.
    pub url: Option<String>,
    /// Whether the site serves TLS.
    pub has_ssl: Option<bool>,
    /// Crawl status.
    pub status: Option<String>,
    /// Screenshot image URL.
    pub screenshot_url: Option<String>,
    /// When the screenshot was taken.
    pub screenshot_date: Option<String>,
    /// Last crawl timestamp.
    pub last_crawl: Option<String>,
    /// Last content change seen by the crawler.
    pub last_updated: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
}

/// A website as served by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    /// Primary key.
    pub id: String,
    /// URL slug; empty when none is stored.
    pub slug: String,
    /// Domain name, e.g. `pfizer.com`.
    pub domain: String,
    /// Site title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Site type: corporate, product, research, disease, patient, news, other.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning company.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// Full URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether the site serves TLS.
    #[serde(rename = "hasSSL", skip_serializing_if = "Option::is_none")]
    pub has_ssl: Option<bool>,
    /// Crawl status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Screenshot image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    /// When the screenshot was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_date: Option<String>,
    /// Last crawl timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_crawl: Option<String>,
    /// Last content change seen by the crawler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Creation timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Ids of the linked therapeutic areas.
    #[serde(default)]
    pub therapeutic_areas: Vec<String>,
}

impl Website {
    /// The slug, or one derived from the domain when none is stored.
    #[must_use]
    pub fn effective_slug(&self) -> String {
        if self.slug.is_empty() {
            crate::text::domain_slug(&self.domain)
        } else {
            self.slug.clone()
        }
    }

    /// Convert back into a table row for inserts.
    #[must_use]
    pub fn to_row(&self) -> WebsiteRow {
        WebsiteRow {
            id: self.id.clone(),
            slug: Some(self.slug.clone()).filter(|s| !s.is_empty()),
            domain: self.domain.clone(),
            site_name: self.site_name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            company_id: self.company_id.clone(),
            url: self.url.clone(),
            has_ssl: self.has_ssl,
            status: self.status.clone(),
            screenshot_url: self.screenshot_url.clone(),
            screenshot_date: self.screenshot_date.clone(),
            last_crawl: self.last_crawl.clone(),
            last_updated: self.last_updated.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

impl From<WebsiteRow> for Website {
    fn from(row: WebsiteRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug.unwrap_or_default(),
            domain: row.domain,
            site_name: non_empty(row.site_name),
            category: non_empty(row.category),
            description: non_empty(row.description),
            company_id: non_empty(row.company_id),
            url: non_empty(row.url),
            // `false` is meaningful here, only NULL is dropped.
            has_ssl: row.has_ssl,
            status: non_empty(row.status),
            screenshot_url: non_empty(row.screenshot_url),
            screenshot_date: non_empty(row.screenshot_date),
            last_crawl: non_empty(row.last_crawl),
            last_updated: non_empty(row.last_updated),
            created_at: non_empty(row.created_at),
            updated_at: non_empty(row.updated_at),
            therapeutic_areas: Vec::new(),
        }
    }
}

impl TableRow for WebsiteRow {
    const TABLE: &'static str = "websites";

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "slug",
        "domain",
        "site_name",
        "category",
        "description",
        "company_id",
        "url",
        "has_ssl",
        "status",
        "screenshot_url",
        "screenshot_date",
        "last_crawl",
        "last_updated",
        "created_at",
        "updated_at",
    ];

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            slug: row.get("slug")?,
            domain: row.get("domain")?,
            site_name: row.get("site_name")?,
            category: row.get("category")?,
            description: row.get("description")?,
            company_id: row.get("company_id")?,
            url: row.get("url")?,
            has_ssl: row.get("has_ssl")?,
            status: row.get("status")?,
            screenshot_url: row.get("screenshot_url")?,
            screenshot_date: row.get("screenshot_date")?,
            last_crawl: row.get("last_crawl")?,
            last_updated: row.get("last_updated")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.clone().into(),
            self.slug.clone().into(),
            self.domain.clone().into(),
            self.site_name.clone().into(),
            self.category.clone().into(),
            self.description.clone().into(),
            self.company_id.clone().into(),
            self.url.clone().into(),
            self.has_ssl.into(),
            self.status.clone().into(),
            self.screenshot_url.clone().into(),
            self.screenshot_date.clone().into(),
            self.last_crawl.clone().into(),
            self.last_updated.clone().into(),
            self.created_at.clone().into(),
            self.updated_at.clone().into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_keeps_false_ssl() {
        let row = WebsiteRow {
            id: "w".into(),
            domain: "example.com".into(),
            has_ssl: Some(false),
            site_name: Some(String::new()),
            ..WebsiteRow::default()
        };
        let site = Website::from(row);
        assert_eq!(site.has_ssl, Some(false));
        assert!(site.site_name.is_none());
    }

    #[test]
    fn test_serializes_has_ssl_key() {
        let site = Website {
            id: "w".into(),
            domain: "pfizer.com".into(),
            has_ssl: Some(true),
            site_name: Some("Pfizer".into()),
            ..Website::default()
        };
        let json = serde_json::to_value(site).unwrap();
        assert_eq!(json["hasSSL"], true);
        assert_eq!(json["siteName"], "Pfizer");
    }

    #[test]
    fn test_effective_slug_falls_back_to_domain() {
        let site = Website {
            domain: "pfizer.com".into(),
            ..Website::default()
        };
        assert_eq!(site.effective_slug(), "pfizer-com");

        let site = Website {
            slug: "pfizer-corporate".into(),
            ..site
        };
        assert_eq!(site.effective_slug(), "pfizer-corporate");
    }
}
