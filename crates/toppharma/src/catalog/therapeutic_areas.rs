//! Therapeutic area list and detail.
//!
//! Area statistics come from the join tables: companies and products are
//! counted through their links, websites through the companies that own
//! them.

use std::collections::HashMap;

use serde::Serialize;

use super::params::contains_pattern;
use super::{
    find_by_slug_or_id, left_ids, links, options, or_log, rank_by_count, rows_by_ids, ListParams,
    SelectOption,
};
use crate::model::{
    Company, CompanyRow, Product, ProductRow, TherapeuticArea, TherapeuticAreaRow, WebsiteRow,
};
use crate::query::{Direction, Page, PageInfo, Select};
use crate::storage::{Link, Relation, Side, Storage};

/// Related areas shown on an area page.
pub const RELATED_AREAS: usize = 5;

const SORT_OPTIONS: &[(&str, &str)] = &[
    ("name_asc", "Name (A to Z)"),
    ("name_desc", "Name (Z to A)"),
    ("companies_desc", "Most Companies"),
    ("products_desc", "Most Products"),
    ("websites_desc", "Most Websites"),
];

/// A therapeutic area with usage counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaStats {
    /// The area.
    #[serde(flatten)]
    pub area: TherapeuticArea,
    /// Companies active in the area.
    pub company_count: u64,
    /// Products in the area.
    pub product_count: u64,
    /// Websites of companies active in the area.
    pub website_count: u64,
}

/// Response of the therapeutic area list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapeuticAreaList {
    /// Areas on this page.
    pub therapeutic_areas: Vec<AreaStats>,
    /// Page metadata.
    pub pagination: PageInfo,
    /// Sort in effect, as `<field>_<direction>`.
    pub sort: String,
    /// Sort orders.
    pub sort_options: Vec<SelectOption>,
}

fn count_by_right(links: &[Link]) -> HashMap<&str, u64> {
    let mut counts = HashMap::new();
    for link in links {
        *counts.entry(link.right.as_str()).or_insert(0) += 1;
    }
    counts
}

/// List therapeutic areas with their counts.
///
/// Parameters: `search` (name or description substring), `minCompanies`,
/// `minProducts`, `sort` over `name`, `companies`, `products` or
/// `websites`, and `page`/`limit`. Count sorts keep name order among ties.
#[must_use]
pub fn list_therapeutic_areas(
    storage: &Storage,
    query: &HashMap<String, String>,
) -> TherapeuticAreaList {
    let params = ListParams::new(query);
    let sort = params.sort("name_asc");
    let pagination = params.pagination();

    let mut select = Select::from::<TherapeuticAreaRow>();
    if let Some(search) = params.text("search") {
        select = select.or_ilike(&["name", "description"], contains_pattern(search));
    }
    let name_direction = if sort.field == "name" {
        sort.direction
    } else {
        Direction::Asc
    };
    let rows = or_log(
        storage.select::<TherapeuticAreaRow>(&select.order("name", name_direction)),
        "therapeutic areas",
    );

    let company_links = or_log(
        storage.links(Relation::CompanyTherapeuticArea),
        "company therapeutic areas",
    );
    let product_links = or_log(
        storage.links(Relation::ProductTherapeuticArea),
        "product therapeutic areas",
    );
    let websites = or_log(
        storage.select::<WebsiteRow>(&Select::from::<WebsiteRow>()),
        "websites",
    );

    let companies = count_by_right(&company_links);
    let products = count_by_right(&product_links);
    let mut sites_per_company: HashMap<&str, u64> = HashMap::new();
    for company_id in websites.iter().filter_map(|w| w.company_id.as_deref()) {
        *sites_per_company.entry(company_id).or_insert(0) += 1;
    }
    let mut sites_per_area: HashMap<&str, u64> = HashMap::new();
    for link in &company_links {
        let sites = sites_per_company.get(link.left.as_str()).copied().unwrap_or(0);
        *sites_per_area.entry(link.right.as_str()).or_insert(0) += sites;
    }

    let min_companies = params.int("minCompanies").unwrap_or(0);
    let min_products = params.int("minProducts").unwrap_or(0);

    let mut stats: Vec<AreaStats> = rows
        .into_iter()
        .map(|row| {
            let id = row.id.as_str();
            let company_count = companies.get(id).copied().unwrap_or(0);
            let product_count = products.get(id).copied().unwrap_or(0);
            let website_count = sites_per_area.get(id).copied().unwrap_or(0);
            AreaStats {
                area: TherapeuticArea::from(row),
                company_count,
                product_count,
                website_count,
            }
        })
        .filter(|s| i64::try_from(s.company_count).unwrap_or(i64::MAX) >= min_companies)
        .filter(|s| i64::try_from(s.product_count).unwrap_or(i64::MAX) >= min_products)
        .collect();

    let key: Option<fn(&AreaStats) -> u64> = match sort.field.as_str() {
        "companies" => Some(|s: &AreaStats| s.company_count),
        "products" => Some(|s: &AreaStats| s.product_count),
        "websites" => Some(|s: &AreaStats| s.website_count),
        _ => None,
    };
    if let Some(key) = key {
        stats.sort_by(|a, b| sort.direction.apply(key(a).cmp(&key(b))));
    }

    let page = Page::from_vec(stats, pagination);
    TherapeuticAreaList {
        therapeutic_areas: page.data,
        pagination: page.pagination,
        sort: sort.to_param(),
        sort_options: options(SORT_OPTIONS),
    }
}

/// An area that shares companies or products with another.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedArea {
    /// The related area.
    #[serde(flatten)]
    pub area: TherapeuticArea,
    /// Companies and products tagged with both areas.
    pub shared: u64,
}

/// Response of the therapeutic area detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapeuticAreaDetail {
    /// The area.
    pub therapeutic_area: TherapeuticArea,
    /// Companies active in the area, ordered by name.
    pub companies: Vec<Company>,
    /// Products in the area, ordered by name.
    pub products: Vec<Product>,
    /// Areas most often tagged alongside this one.
    pub related_areas: Vec<RelatedArea>,
}

/// Therapeutic area detail by slug, falling back to id.
#[must_use]
pub fn therapeutic_area_detail(storage: &Storage, key: &str) -> Option<TherapeuticAreaDetail> {
    let row = find_by_slug_or_id::<TherapeuticAreaRow>(storage, key)?;
    let area = TherapeuticArea::from(row);
    let id = vec![area.id.clone()];

    let company_ids = left_ids(&links(storage, Relation::CompanyTherapeuticArea, Side::Right, &id));
    let mut companies: Vec<Company> =
        rows_by_ids::<CompanyRow>(storage, &company_ids, |c| c.id.as_str())
            .into_iter()
            .map(Company::from)
            .collect();
    companies.sort_by(|a, b| a.name.cmp(&b.name));

    let product_ids = left_ids(&links(storage, Relation::ProductTherapeuticArea, Side::Right, &id));
    let mut products: Vec<Product> =
        rows_by_ids::<ProductRow>(storage, &product_ids, |p| p.id.as_str())
            .into_iter()
            .map(Product::from)
            .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));

    let co_tagged: Vec<String> = links(storage, Relation::CompanyTherapeuticArea, Side::Left, &company_ids)
        .into_iter()
        .chain(links(storage, Relation::ProductTherapeuticArea, Side::Left, &product_ids))
        .filter(|l| l.right != area.id)
        .map(|l| l.right)
        .collect();
    let ranked = rank_by_count(co_tagged, RELATED_AREAS);
    let ranked_ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
    let shared: HashMap<String, u64> = ranked.into_iter().collect();
    let related_areas = rows_by_ids::<TherapeuticAreaRow>(storage, &ranked_ids, |a| a.id.as_str())
        .into_iter()
        .map(|row| RelatedArea {
            shared: shared.get(&row.id).copied().unwrap_or(0),
            area: TherapeuticArea::from(row),
        })
        .collect();

    Some(TherapeuticAreaDetail {
        therapeutic_area: area,
        companies,
        products,
        related_areas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::seeded;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn ids(list: &TherapeuticAreaList) -> Vec<&str> {
        list.therapeutic_areas
            .iter()
            .map(|a| a.area.id.as_str())
            .collect()
    }

    #[test]
    fn test_counts() {
        let list = list_therapeutic_areas(&seeded(), &query(&[]));
        assert_eq!(
            ids(&list),
            vec!["cardiovascular", "immunology", "neuroscience", "oncology", "vaccines"]
        );
        let oncology = &list.therapeutic_areas[3];
        assert_eq!(oncology.company_count, 4);
        assert_eq!(oncology.product_count, 4);
        assert_eq!(oncology.website_count, 5);

        let vaccines = &list.therapeutic_areas[4];
        assert_eq!(vaccines.company_count, 2);
        assert_eq!(vaccines.product_count, 2);
        assert_eq!(vaccines.website_count, 3);
    }

    #[test]
    fn test_sort_by_product_count_keeps_name_order_on_ties() {
        let list = list_therapeutic_areas(&seeded(), &query(&[("sort", "products_desc")]));
        assert_eq!(
            ids(&list),
            vec!["oncology", "immunology", "cardiovascular", "vaccines", "neuroscience"]
        );
    }

    #[test]
    fn test_minimum_filters() {
        let list = list_therapeutic_areas(&seeded(), &query(&[("minCompanies", "3")]));
        assert_eq!(ids(&list), vec!["immunology", "oncology"]);

        let list = list_therapeutic_areas(
            &seeded(),
            &query(&[("minCompanies", "2"), ("minProducts", "2")]),
        );
        assert_eq!(
            ids(&list),
            vec!["cardiovascular", "immunology", "oncology", "vaccines"]
        );
    }

    #[test]
    fn test_search_and_pagination() {
        let list = list_therapeutic_areas(&seeded(), &query(&[("search", "onco")]));
        assert_eq!(ids(&list), vec!["oncology"]);

        let list = list_therapeutic_areas(
            &seeded(),
            &query(&[("sort", "name_desc"), ("limit", "2"), ("page", "2")]),
        );
        assert_eq!(ids(&list), vec!["oncology", "neuroscience"]);
        assert_eq!(list.pagination.total, 5);
        assert_eq!(list.pagination.pages, 3);
    }

    #[test]
    fn test_serialized_stats_are_flat() {
        let list = list_therapeutic_areas(&seeded(), &query(&[("search", "vaccines")]));
        let json = serde_json::to_value(&list).unwrap();
        let area = &json["therapeuticAreas"][0];
        assert_eq!(area["name"], "Vaccines");
        assert_eq!(area["companyCount"], 2);
        assert_eq!(json["sortOptions"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_area_detail() {
        let detail = therapeutic_area_detail(&seeded(), "oncology").unwrap();
        let companies: Vec<_> = detail.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(companies, vec!["Merck", "Novartis", "Pfizer", "Roche"]);
        let products: Vec<_> = detail.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(products, vec!["Ibrance", "Keytruda", "Kisqali", "Tecentriq"]);

        let related: Vec<_> = detail
            .related_areas
            .iter()
            .map(|r| (r.area.id.as_str(), r.shared))
            .collect();
        assert_eq!(
            related,
            vec![
                ("immunology", 5),
                ("cardiovascular", 2),
                ("neuroscience", 2),
                ("vaccines", 2)
            ]
        );
    }

    #[test]
    fn test_area_detail_unknown() {
        assert!(therapeutic_area_detail(&seeded(), "dermatology").is_none());
    }
}
