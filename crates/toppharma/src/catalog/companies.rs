//! Company list and detail.

use std::collections::HashMap;

use serde::Serialize;

use super::params::contains_pattern;
use super::{
    all_areas, area_names, area_options, find_by_slug_or_id, group_by_left, left_ids, links,
    names_for, options, or_log, right_ids, rows_by_ids, ListParams, SelectOption,
};
use crate::model::{
    Company, CompanyRow, Product, ProductRow, TherapeuticArea, TherapeuticAreaRow, Website,
    WebsiteRow,
};
use crate::query::{Direction, PageInfo, Select};
use crate::storage::{Relation, Side, Storage};

/// Upper bound of the market-cap filter; bounds at or above it are ignored.
pub const MAX_MARKET_CAP: i64 = 2000;

const REGIONS: &[(&str, &str)] = &[
    ("north-america", "North America"),
    ("europe", "Europe"),
    ("asia", "Asia"),
    ("united-states", "United States"),
    ("switzerland", "Switzerland"),
    ("germany", "Germany"),
    ("japan", "Japan"),
    ("united-kingdom", "United Kingdom"),
    ("france", "France"),
    ("china", "China"),
    ("other", "Other"),
];

const SORT_OPTIONS: &[(&str, &str)] = &[
    ("name_asc", "Name (A to Z)"),
    ("name_desc", "Name (Z to A)"),
    ("marketCap_desc", "Market Cap (High to Low)"),
    ("marketCap_asc", "Market Cap (Low to High)"),
    ("founded_desc", "Founded (Newest First)"),
    ("founded_asc", "Founded (Oldest First)"),
];

/// A company in the list, with its therapeutic area names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyListItem {
    /// The company.
    #[serde(flatten)]
    pub company: Company,
    /// Names of the company's therapeutic areas.
    pub therapeutic_area_names: Vec<String>,
}

/// Filter and sort choices offered with the company list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFilterOptions {
    /// Therapeutic areas ordered by name.
    pub therapeutic_areas: Vec<SelectOption>,
    /// Headquarters regions.
    pub regions: Vec<SelectOption>,
    /// Sort orders.
    pub sort_options: Vec<SelectOption>,
}

/// Response of the company list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyList {
    /// Companies on this page.
    pub companies: Vec<CompanyListItem>,
    /// Page metadata.
    pub pagination: PageInfo,
    /// Sort in effect, as `<field>_<direction>`.
    pub sort: String,
    /// Filter choices.
    pub filters: CompanyFilterOptions,
}

/// List companies.
///
/// Parameters: `search` (name substring), `regions` (headquarters values),
/// `tas` (therapeutic area ids, any match), `minMarketCap`,
/// `maxMarketCap`, `sort` and `page`/`limit`.
#[must_use]
pub fn list_companies(storage: &Storage, query: &HashMap<String, String>) -> CompanyList {
    let params = ListParams::new(query);
    let sort = params.sort("name_asc");
    let pagination = params.pagination();

    let mut select = Select::from::<CompanyRow>();
    if let Some(search) = params.text("search") {
        select = select.ilike("name", contains_pattern(search));
    }
    let regions = params.list("regions");
    if !regions.is_empty() {
        select = select.in_list("headquarters", regions);
    }
    let tas = params.list("tas");
    if !tas.is_empty() {
        let ids = left_ids(&links(storage, Relation::CompanyTherapeuticArea, Side::Right, &tas));
        select = select.in_list("id", ids);
    }
    let min_cap = params.int("minMarketCap").unwrap_or(0);
    let max_cap = params.int("maxMarketCap").unwrap_or(MAX_MARKET_CAP);
    if min_cap > 0 {
        select = select.gte("market_cap", min_cap);
    }
    if max_cap < MAX_MARKET_CAP {
        select = select.lte("market_cap", max_cap);
    }

    let total = or_log(storage.count(&select), "companies");
    let column = match sort.field.as_str() {
        "name" => Some("name"),
        "marketCap" => Some("market_cap"),
        "founded" => Some("founded"),
        _ => None,
    };
    if let Some(column) = column {
        select = select.order(column, sort.direction);
    }
    let (start, end) = pagination.range();
    let rows = or_log(storage.select::<CompanyRow>(&select.range(start, end)), "companies");

    let areas = all_areas(storage);
    let names = area_names(&areas);
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let area_ids = group_by_left(&links(storage, Relation::CompanyTherapeuticArea, Side::Left, &ids));

    let companies = rows
        .into_iter()
        .map(|row| {
            let mut company = Company::from(row);
            company.therapeutic_areas = area_ids.get(&company.id).cloned().unwrap_or_default();
            let therapeutic_area_names = names_for(&company.therapeutic_areas, &names);
            CompanyListItem {
                company,
                therapeutic_area_names,
            }
        })
        .collect();

    CompanyList {
        companies,
        pagination: PageInfo::new(total, pagination),
        sort: sort.to_param(),
        filters: CompanyFilterOptions {
            therapeutic_areas: area_options(&areas),
            regions: options(REGIONS),
            sort_options: options(SORT_OPTIONS),
        },
    }
}

/// Response of the company detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetail {
    /// The company.
    pub company: Company,
    /// Its therapeutic areas, ordered by name.
    pub therapeutic_areas: Vec<TherapeuticArea>,
    /// Its products, ordered by name.
    pub products: Vec<Product>,
    /// Its websites, ordered by domain.
    pub websites: Vec<Website>,
}

/// Company detail by slug, falling back to id.
#[must_use]
pub fn company_detail(storage: &Storage, key: &str) -> Option<CompanyDetail> {
    let row = find_by_slug_or_id::<CompanyRow>(storage, key)?;
    let mut company = Company::from(row);
    let id = vec![company.id.clone()];

    let area_ids = right_ids(&links(storage, Relation::CompanyTherapeuticArea, Side::Left, &id));
    let mut therapeutic_areas: Vec<TherapeuticArea> =
        rows_by_ids::<TherapeuticAreaRow>(storage, &area_ids, |a| a.id.as_str())
            .into_iter()
            .map(TherapeuticArea::from)
            .collect();
    therapeutic_areas.sort_by(|a, b| a.name.cmp(&b.name));
    company.therapeutic_areas = area_ids;

    let products = or_log(
        storage.select::<ProductRow>(
            &Select::from::<ProductRow>()
                .eq("company_id", company.id.as_str())
                .order("name", Direction::Asc),
        ),
        "company products",
    )
    .into_iter()
    .map(Product::from)
    .collect();

    let websites = or_log(
        storage.select::<WebsiteRow>(
            &Select::from::<WebsiteRow>()
                .eq("company_id", company.id.as_str())
                .order("domain", Direction::Asc),
        ),
        "company websites",
    )
    .into_iter()
    .map(Website::from)
    .collect();

    Some(CompanyDetail {
        company,
        therapeutic_areas,
        products,
        websites,
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

    fn ids(list: &CompanyList) -> Vec<&str> {
        list.companies.iter().map(|c| c.company.id.as_str()).collect()
    }

    #[test]
    fn test_default_sort_is_name_ascending() {
        let list = list_companies(&seeded(), &query(&[]));
        assert_eq!(ids(&list), vec!["merck", "novartis", "pfizer", "roche"]);
        assert_eq!(list.sort, "name_asc");
        assert_eq!(list.pagination.total, 4);
        assert_eq!(list.pagination.limit, 20);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let list = list_companies(&seeded(), &query(&[("search", "PFI")]));
        assert_eq!(ids(&list), vec!["pfizer"]);
    }

    #[test]
    fn test_search_without_matches_is_empty() {
        let list = list_companies(&seeded(), &query(&[("search", "zzz")]));
        assert!(list.companies.is_empty());
        assert_eq!(list.pagination.total, 0);
        // filter options still render
        assert_eq!(list.filters.regions.len(), 11);
        assert_eq!(list.filters.therapeutic_areas.len(), 5);
    }

    #[test]
    fn test_therapeutic_area_filter() {
        let list = list_companies(&seeded(), &query(&[("tas", "neuroscience,vaccines")]));
        assert_eq!(ids(&list), vec!["merck", "novartis", "pfizer", "roche"]);

        let list = list_companies(&seeded(), &query(&[("tas", "cardiovascular")]));
        assert_eq!(ids(&list), vec!["merck", "novartis"]);
    }

    #[test]
    fn test_market_cap_bounds() {
        let list = list_companies(
            &seeded(),
            &query(&[("minMarketCap", "190"), ("sort", "marketCap_desc")]),
        );
        assert_eq!(ids(&list), vec!["roche", "pfizer"]);

        let list = list_companies(&seeded(), &query(&[("maxMarketCap", "185")]));
        assert_eq!(ids(&list), vec!["merck", "novartis"]);

        // 2000 means unbounded
        let list = list_companies(&seeded(), &query(&[("maxMarketCap", "2000")]));
        assert_eq!(list.pagination.total, 4);
    }

    #[test]
    fn test_regions_match_headquarters_exactly() {
        let storage = seeded();
        storage
            .insert(&CompanyRow {
                id: "lonza".into(),
                name: "Lonza".into(),
                headquarters: Some("switzerland".into()),
                ..CompanyRow::default()
            })
            .unwrap();

        let list = list_companies(&storage, &query(&[("regions", "switzerland,germany")]));
        assert_eq!(ids(&list), vec!["lonza"]);
    }

    #[test]
    fn test_items_carry_area_names() {
        let list = list_companies(&seeded(), &query(&[("search", "roche")]));
        let mut names = list.companies[0].therapeutic_area_names.clone();
        names.sort();
        assert_eq!(names, vec!["Immunology", "Neuroscience", "Oncology"]);
    }

    #[test]
    fn test_pagination() {
        let list = list_companies(&seeded(), &query(&[("limit", "3"), ("page", "2")]));
        assert_eq!(ids(&list), vec!["roche"]);
        assert_eq!(list.pagination.pages, 2);
    }

    #[test]
    fn test_company_detail() {
        let detail = company_detail(&seeded(), "merck").unwrap();
        assert_eq!(detail.company.name, "Merck");
        let areas: Vec<_> = detail.therapeutic_areas.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(areas, vec!["Cardiovascular", "Oncology", "Vaccines"]);
        let products: Vec<_> = detail.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(products, vec!["Gardasil", "Keytruda"]);
        assert_eq!(detail.websites.len(), 1);
    }

    #[test]
    fn test_company_detail_unknown() {
        assert!(company_detail(&seeded(), "acme").is_none());
    }

    #[test]
    fn test_serialized_item_is_flat() {
        let list = list_companies(&seeded(), &query(&[("search", "merck")]));
        let json = serde_json::to_value(&list).unwrap();
        let item = &json["companies"][0];
        assert_eq!(item["name"], "Merck");
        assert_eq!(item["marketCap"], 180.2);
        assert!(item["therapeuticAreaNames"].is_array());
        assert_eq!(json["pagination"]["total"], 1);
    }
}
