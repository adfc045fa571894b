//! In-memory data source over the demo catalog.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value as Json;

use super::{DataSource, SourceKind};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::model::{Company, Product, TherapeuticArea, Website};
use crate::query::{FilterValue, Page, QueryOptions};
use crate::text::contains_normalized;

/// Serves a fixed [`Dataset`] from memory.
///
/// Filters compare against the serialized camelCase record: text matches
/// string fields as a case- and accent-insensitive substring and list fields by
/// membership, other values must match exactly. A record without the field
/// never matches.
#[derive(Debug, Clone)]
pub struct MockSource {
    data: Dataset,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new(Dataset::demo())
    }
}

impl MockSource {
    /// Serve `data`.
    #[must_use]
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }
}

fn text_matches(field: &Json, text: &str) -> bool {
    match field {
        Json::Array(items) => items.iter().any(|i| i.as_str() == Some(text)),
        Json::String(s) => contains_normalized(s, text.trim_matches('%')),
        _ => false,
    }
}

fn value_matches(field: &Json, value: &FilterValue) -> bool {
    match value {
        FilterValue::Text(text) => text_matches(field, text),
        FilterValue::List(options) => match field {
            Json::Array(items) => items
                .iter()
                .filter_map(Json::as_str)
                .any(|i| options.iter().any(|o| o == i)),
            Json::String(s) => options.iter().any(|o| o == s),
            _ => false,
        },
        FilterValue::Number(n) => field.as_f64() == Some(*n),
        FilterValue::Bool(b) => field.as_bool() == Some(*b),
    }
}

/// Ascending order of two JSON values; missing values sort last.
fn compare(a: Option<&Json>, b: Option<&Json>) -> Ordering {
    match (a, b) {
        (Some(Json::Number(x)), Some(Json::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Json::String(x)), Some(Json::String(y))) => x.cmp(y),
        (Some(Json::Bool(x)), Some(Json::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Filter, sort and page a slice of records.
fn apply<T: Serialize + Clone>(items: &[T], options: &QueryOptions) -> Result<Page<T>> {
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        rows.push((serde_json::to_value(item)?, item));
    }

    rows.retain(|(json, _)| {
        options
            .filters
            .iter()
            .all(|(field, value)| json.get(field).is_some_and(|f| value_matches(f, value)))
    });

    if let Some(sort) = &options.sort {
        let field = sort.field.as_str();
        rows.sort_by(|(a, _), (b, _)| {
            let (a, b) = (a.get(field), b.get(field));
            match (a, b) {
                (Some(_), Some(_)) => sort.direction.apply(compare(a, b)),
                _ => compare(a, b),
            }
        });
    }

    let items = rows.into_iter().map(|(_, item)| item.clone()).collect();
    Ok(Page::from_vec(items, options.pagination_or_default()))
}

#[async_trait::async_trait]
impl DataSource for MockSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Mock
    }

    fn name(&self) -> &'static str {
        "Mock data"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn company_by_id(&self, id: &str) -> Result<Option<Company>> {
        Ok(self.data.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn companies(&self, options: &QueryOptions) -> Result<Page<Company>> {
        apply(&self.data.companies, options)
    }

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn products(&self, options: &QueryOptions) -> Result<Page<Product>> {
        apply(&self.data.products, options)
    }

    async fn products_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<Product>> {
        let products: Vec<Product> = self
            .data
            .products
            .iter()
            .filter(|p| p.company_id.as_deref() == Some(company_id))
            .cloned()
            .collect();
        apply(&products, options)
    }

    async fn website_by_id(&self, id: &str) -> Result<Option<Website>> {
        Ok(self.data.websites.iter().find(|w| w.id == id).cloned())
    }

    async fn websites(&self, options: &QueryOptions) -> Result<Page<Website>> {
        apply(&self.data.websites, options)
    }

    async fn websites_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<Website>> {
        let websites: Vec<Website> = self
            .data
            .websites
            .iter()
            .filter(|w| w.company_id.as_deref() == Some(company_id))
            .cloned()
            .collect();
        apply(&websites, options)
    }

    async fn therapeutic_area_by_id(&self, id: &str) -> Result<Option<TherapeuticArea>> {
        Ok(self
            .data
            .therapeutic_areas
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn therapeutic_areas(&self, options: &QueryOptions) -> Result<Page<TherapeuticArea>> {
        apply(&self.data.therapeutic_areas, options)
    }

    async fn therapeutic_areas_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<TherapeuticArea>> {
        let area_ids: Vec<&str> = self
            .data
            .company_areas
            .iter()
            .filter(|l| l.left == company_id)
            .map(|l| l.right.as_str())
            .collect();
        let areas: Vec<TherapeuticArea> = self
            .data
            .therapeutic_areas
            .iter()
            .filter(|a| area_ids.contains(&a.id.as_str()))
            .cloned()
            .collect();
        apply(&areas, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;

    #[tokio::test]
    async fn test_health_check_always_true() {
        assert!(MockSource::default().health_check().await);
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let source = MockSource::default();
        let product = source.product_by_id("product1").await.unwrap().unwrap();
        assert_eq!(product.name, "Comirnaty");
        assert!(source.website_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_text_filter_is_case_insensitive_substring() {
        let source = MockSource::default();
        let options =
            QueryOptions::default().filter("headquarters", FilterValue::Text("switzerland".into()));
        let page = source.companies(&options).await.unwrap();
        let ids: Vec<_> = page.data.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["novartis", "roche"]);

        let options =
            QueryOptions::default().filter("headquarters", FilterValue::Text("%BÂSEL%".into()));
        assert_eq!(source.companies(&options).await.unwrap().pagination.total, 2);
    }

    #[tokio::test]
    async fn test_text_filter_matches_array_membership() {
        let source = MockSource::default();
        let options = QueryOptions::default()
            .filter("therapeuticAreas", FilterValue::Text("neuroscience".into()));
        let page = source.companies(&options).await.unwrap();
        let ids: Vec<_> = page.data.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["novartis", "roche"]);
    }

    #[tokio::test]
    async fn test_number_and_bool_filters_match_exactly() {
        let source = MockSource::default();
        let options = QueryOptions::default().filter("founded", FilterValue::Number(1849.0));
        let page = source.companies(&options).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "pfizer");

        let options = QueryOptions::default().filter("hasSSL", FilterValue::Bool(false));
        assert!(source.websites(&options).await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn test_missing_field_never_matches() {
        let source = MockSource::default();
        let options =
            QueryOptions::default().filter("ceo", FilterValue::Text("Albert Bourla".into()));
        let page = source.companies(&options).await.unwrap();
        assert_eq!(page.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_sort_and_paginate() {
        let source = MockSource::default();
        let options = QueryOptions::default()
            .sort("founded", Direction::Desc)
            .page(2, 3);
        let page = source.companies(&options).await.unwrap();

        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.pagination.pages, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "pfizer");
    }

    #[tokio::test]
    async fn test_default_pagination() {
        let source = MockSource::default();
        let page = source.products(&QueryOptions::default()).await.unwrap();
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, 10);
        assert_eq!(page.data.len(), 10);
    }

    #[tokio::test]
    async fn test_scoped_lists() {
        let source = MockSource::default();
        let products = source
            .products_for_company("novartis", &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(products.pagination.total, 4);

        let areas = source
            .therapeutic_areas_for_company("merck", &QueryOptions::default())
            .await
            .unwrap();
        let mut ids: Vec<_> = areas.data.iter().map(|a| a.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["cardiovascular", "oncology", "vaccines"]);
    }
}
