//! Directory pages: lists with filters, detail views, the dashboard and the
//! home summary.
//!
//! Every function here reads [`Storage`] directly and never fails: a
//! database error is logged and the affected part of the response falls
//! back to an empty list, `None` or a zero count, so the rest of the page
//! still renders.

mod companies;
mod dashboard;
mod params;
mod products;
mod therapeutic_areas;
mod websites;

pub use companies::{company_detail, list_companies, CompanyDetail, CompanyList, CompanyListItem};
pub use dashboard::{dashboard, home, Dashboard, DirectoryCounts, Home, TrendingProduct};
pub use params::{ListParams, LIST_PAGE_SIZE};
pub use products::{list_products, product_detail, ProductDetail, ProductList, ProductListItem};
pub use therapeutic_areas::{
    list_therapeutic_areas, therapeutic_area_detail, AreaStats, RelatedArea, TherapeuticAreaDetail,
    TherapeuticAreaList,
};
pub use websites::{list_websites, website_detail, WebsiteDetail, WebsiteList, WebsiteListItem};

use std::collections::HashMap;

use serde::Serialize;
use tracing::error;

use crate::error::Result;
use crate::model::{CompanyRow, TableRow, TherapeuticArea, TherapeuticAreaRow};
use crate::query::{Direction, Select};
use crate::storage::{Link, Relation, Side, Storage};

/// A value/label pair offered as a filter or sort choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Parameter value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl SelectOption {
    /// Build an option.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Build options from static value/label pairs.
pub(crate) fn options(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
    pairs
        .iter()
        .map(|(value, label)| SelectOption::new(*value, *label))
        .collect()
}

/// The minimal company shape embedded in other entities' responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRef {
    /// Company id.
    pub id: String,
    /// Company name.
    pub name: String,
    /// Company slug.
    pub slug: String,
}

impl From<&CompanyRow> for CompanyRef {
    fn from(row: &CompanyRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            slug: row.slug.clone().unwrap_or_default(),
        }
    }
}

/// Unwrap a storage result, logging and defaulting on error.
pub(crate) fn or_log<T: Default>(result: Result<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!("Error fetching {}: {}", what, e);
            T::default()
        }
    }
}

/// Find a row by slug, then by id.
pub(crate) fn find_by_slug_or_id<R: TableRow>(storage: &Storage, key: &str) -> Option<R> {
    let by_slug = or_log(
        storage.first::<R>(Select::from::<R>().eq("slug", key)),
        R::TABLE,
    );
    by_slug.or_else(|| or_log(storage.first::<R>(Select::from::<R>().eq("id", key)), R::TABLE))
}

/// Rows whose id is in `ids`, in the order of `ids`.
pub(crate) fn rows_by_ids<R: TableRow>(
    storage: &Storage,
    ids: &[String],
    id_of: impl Fn(&R) -> &str,
) -> Vec<R> {
    if ids.is_empty() {
        return Vec::new();
    }
    let mut rows = or_log(
        storage.select::<R>(&Select::from::<R>().in_list("id", ids.iter())),
        R::TABLE,
    );
    rows.sort_by_key(|r| ids.iter().position(|id| id == id_of(r)).unwrap_or(usize::MAX));
    rows
}

/// Join rows of `relation` filtered on one side, logging on error.
pub(crate) fn links(storage: &Storage, relation: Relation, side: Side, ids: &[String]) -> Vec<Link> {
    or_log(storage.links_for(relation, side, ids), relation.table())
}

/// Distinct left ids of `links`, in first-seen order.
pub(crate) fn left_ids(links: &[Link]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for link in links {
        if !ids.contains(&link.left) {
            ids.push(link.left.clone());
        }
    }
    ids
}

/// Distinct right ids of `links`, in first-seen order.
pub(crate) fn right_ids(links: &[Link]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for link in links {
        if !ids.contains(&link.right) {
            ids.push(link.right.clone());
        }
    }
    ids
}

/// Group join rows into left id -> right ids.
pub(crate) fn group_by_left(links: &[Link]) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for link in links {
        grouped
            .entry(link.left.clone())
            .or_default()
            .push(link.right.clone());
    }
    grouped
}

/// Every therapeutic area ordered by name.
pub(crate) fn all_areas(storage: &Storage) -> Vec<TherapeuticArea> {
    or_log(
        storage.select::<TherapeuticAreaRow>(
            &Select::from::<TherapeuticAreaRow>().order("name", Direction::Asc),
        ),
        "therapeutic areas",
    )
    .into_iter()
    .map(TherapeuticArea::from)
    .collect()
}

/// Area filter options ordered by name.
pub(crate) fn area_options(areas: &[TherapeuticArea]) -> Vec<SelectOption> {
    areas
        .iter()
        .map(|a| SelectOption::new(a.id.clone(), a.name.clone()))
        .collect()
}

/// Area id -> name.
pub(crate) fn area_names(areas: &[TherapeuticArea]) -> HashMap<String, String> {
    areas
        .iter()
        .map(|a| (a.id.clone(), a.name.clone()))
        .collect()
}

/// Resolve area ids to names, dropping unknown ids.
pub(crate) fn names_for(ids: &[String], names: &HashMap<String, String>) -> Vec<String> {
    ids.iter().filter_map(|id| names.get(id).cloned()).collect()
}

/// Company filter options ordered by name.
pub(crate) fn company_options(storage: &Storage) -> Vec<SelectOption> {
    or_log(
        storage.select::<CompanyRow>(&Select::from::<CompanyRow>().order("name", Direction::Asc)),
        "companies",
    )
    .into_iter()
    .map(|c| SelectOption::new(c.id, c.name))
    .collect()
}

/// Company references keyed by id for the given ids.
pub(crate) fn company_refs(storage: &Storage, ids: &[String]) -> HashMap<String, CompanyRef> {
    rows_by_ids::<CompanyRow>(storage, ids, |c| c.id.as_str())
        .iter()
        .map(|c| (c.id.clone(), CompanyRef::from(c)))
        .collect()
}

/// Rank ids by how often they occur, most first, ties broken by id.
pub(crate) fn rank_by_count(ids: Vec<String>, limit: usize) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    for id in ids {
        match counts.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, n)) => *n += 1,
            None => counts.push((id, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::model::ProductRow;

    pub(crate) fn seeded() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        storage.import(&Dataset::demo()).unwrap();
        storage
    }

    #[test]
    fn test_find_by_slug_or_id() {
        let storage = seeded();
        let by_slug: Option<ProductRow> = find_by_slug_or_id(&storage, "comirnaty");
        assert_eq!(by_slug.unwrap().id, "product1");

        let by_id: Option<ProductRow> = find_by_slug_or_id(&storage, "product1");
        assert_eq!(by_id.unwrap().name, "Comirnaty");

        let missing: Option<ProductRow> = find_by_slug_or_id(&storage, "nothing");
        assert!(missing.is_none());
    }

    #[test]
    fn test_rows_by_ids_keeps_order() {
        let storage = seeded();
        let ids = vec!["roche".to_string(), "merck".to_string(), "nope".to_string()];
        let rows = rows_by_ids::<CompanyRow>(&storage, &ids, |c| c.id.as_str());
        let got: Vec<_> = rows.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(got, vec!["roche", "merck"]);
    }

    #[test]
    fn test_rank_by_count() {
        let ids = ["b", "a", "b", "c", "a", "b"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let ranked = rank_by_count(ids, 2);
        assert_eq!(ranked, vec![("b".to_string(), 3), ("a".to_string(), 2)]);
    }

    #[test]
    fn test_or_log_defaults_on_error() {
        let result: Result<Vec<u8>> = Err(crate::error::Error::internal("boom"));
        assert!(or_log(result, "things").is_empty());
    }

    #[test]
    fn test_names_for_drops_unknown() {
        let areas = all_areas(&seeded());
        let names = area_names(&areas);
        let got = names_for(&["oncology".into(), "ghost".into()], &names);
        assert_eq!(got, vec!["Oncology"]);
    }
}
