//! Website list and detail.

use std::collections::HashMap;

use serde::Serialize;

use super::params::contains_pattern;
use super::{
    all_areas, area_names, area_options, company_options, company_refs, find_by_slug_or_id,
    group_by_left, left_ids, links, names_for, options, or_log, right_ids, rows_by_ids,
    ListParams, SelectOption,
};
use crate::model::{
    Company, CompanyRow, Product, ProductRow, TherapeuticArea, TherapeuticAreaRow, Website,
    WebsiteRow,
};
use crate::query::{PageInfo, Select};
use crate::storage::{Relation, Side, Storage};

const WEBSITE_TYPES: &[(&str, &str)] = &[
    ("corporate", "Corporate"),
    ("product", "Product"),
    ("research", "Research"),
    ("disease", "Disease Awareness"),
    ("patient", "Patient Support"),
    ("news", "News"),
    ("other", "Other"),
];

const SORT_OPTIONS: &[(&str, &str)] = &[
    ("domain_asc", "Domain (A to Z)"),
    ("domain_desc", "Domain (Z to A)"),
    ("title_asc", "Title (A to Z)"),
    ("title_desc", "Title (Z to A)"),
    ("date_desc", "Newest First"),
    ("date_asc", "Oldest First"),
];

/// A website in the list, with its company's name and therapeutic areas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteListItem {
    /// The website.
    #[serde(flatten)]
    pub website: Website,
    /// Name of the owning company.
    pub company_name: Option<String>,
    /// Therapeutic area names of the owning company.
    pub therapeutic_area_names: Vec<String>,
}

/// Filter and sort choices offered with the website list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteFilterOptions {
    /// Companies ordered by name.
    pub companies: Vec<SelectOption>,
    /// Therapeutic areas ordered by name.
    pub therapeutic_areas: Vec<SelectOption>,
    /// Website categories.
    pub types: Vec<SelectOption>,
    /// Sort orders.
    pub sort_options: Vec<SelectOption>,
}

/// Response of the website list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteList {
    /// Websites on this page.
    pub websites: Vec<WebsiteListItem>,
    /// Page metadata.
    pub pagination: PageInfo,
    /// Sort in effect, as `<field>_<direction>`.
    pub sort: String,
    /// Filter choices.
    pub filters: WebsiteFilterOptions,
}

/// List websites.
///
/// Parameters: `search` (domain, site name or description substring),
/// `companies`, `types` (categories), `tas` (websites of companies in any
/// of the areas), `sort` over `domain`, `title` or `date`, and
/// `page`/`limit`.
#[must_use]
pub fn list_websites(storage: &Storage, query: &HashMap<String, String>) -> WebsiteList {
    let params = ListParams::new(query);
    let sort = params.sort("domain_asc");
    let pagination = params.pagination();

    let mut select = Select::from::<WebsiteRow>();
    if let Some(search) = params.text("search") {
        select = select.or_ilike(&["domain", "site_name", "description"], contains_pattern(search));
    }
    let companies = params.list("companies");
    if !companies.is_empty() {
        select = select.in_list("company_id", companies);
    }
    let types = params.list("types");
    if !types.is_empty() {
        select = select.in_list("category", types);
    }
    let tas = params.list("tas");
    if !tas.is_empty() {
        let company_ids =
            left_ids(&links(storage, Relation::CompanyTherapeuticArea, Side::Right, &tas));
        select = select.in_list("company_id", company_ids);
    }

    let total = or_log(storage.count(&select), "websites");
    let column = match sort.field.as_str() {
        "domain" => Some("domain"),
        "title" => Some("site_name"),
        "date" => Some("created_at"),
        _ => None,
    };
    if let Some(column) = column {
        select = select.order(column, sort.direction);
    }
    let (start, end) = pagination.range();
    let rows = or_log(storage.select::<WebsiteRow>(&select.range(start, end)), "websites");

    let mut company_ids: Vec<String> = Vec::new();
    for id in rows.iter().filter_map(|r| r.company_id.as_ref()) {
        if !company_ids.contains(id) {
            company_ids.push(id.clone());
        }
    }
    let companies = company_refs(storage, &company_ids);
    let company_areas = group_by_left(&links(
        storage,
        Relation::CompanyTherapeuticArea,
        Side::Left,
        &company_ids,
    ));
    let areas = all_areas(storage);
    let names = area_names(&areas);

    let websites = rows
        .into_iter()
        .map(|row| {
            let mut website = Website::from(row);
            let area_ids = website
                .company_id
                .as_ref()
                .and_then(|id| company_areas.get(id))
                .cloned()
                .unwrap_or_default();
            let company_name = website
                .company_id
                .as_ref()
                .and_then(|id| companies.get(id))
                .map(|c| c.name.clone());
            let therapeutic_area_names = names_for(&area_ids, &names);
            website.therapeutic_areas = area_ids;
            WebsiteListItem {
                website,
                company_name,
                therapeutic_area_names,
            }
        })
        .collect();

    WebsiteList {
        websites,
        pagination: PageInfo::new(total, pagination),
        sort: sort.to_param(),
        filters: WebsiteFilterOptions {
            companies: company_options(storage),
            therapeutic_areas: area_options(&areas),
            types: options(WEBSITE_TYPES),
            sort_options: options(SORT_OPTIONS),
        },
    }
}

/// Response of the website detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteDetail {
    /// The website.
    pub website: Website,
    /// The owning company.
    pub company: Option<Company>,
    /// Products featured on the website.
    pub products: Vec<Product>,
    /// Therapeutic areas of the owning company.
    pub therapeutic_areas: Vec<TherapeuticArea>,
}

/// Website detail by slug or id.
///
/// Websites stored without a slug are found by the slug derived from their
/// domain, so `pfizer-com` reaches `pfizer.com` either way.
#[must_use]
pub fn website_detail(storage: &Storage, key: &str) -> Option<WebsiteDetail> {
    let website = find_by_slug_or_id::<WebsiteRow>(storage, key)
        .map(Website::from)
        .or_else(|| find_by_domain_slug(storage, key))?;
    let id = vec![website.id.clone()];

    let company = website.company_id.as_ref().and_then(|company_id| {
        or_log(
            storage.first::<CompanyRow>(Select::from::<CompanyRow>().eq("id", company_id)),
            "website company",
        )
        .map(Company::from)
    });

    let product_ids = left_ids(&links(storage, Relation::ProductWebsite, Side::Right, &id));
    let products = rows_by_ids::<ProductRow>(storage, &product_ids, |p| p.id.as_str())
        .into_iter()
        .map(Product::from)
        .collect();

    let company_ids: Vec<String> = website.company_id.iter().cloned().collect();
    let area_ids = right_ids(&links(
        storage,
        Relation::CompanyTherapeuticArea,
        Side::Left,
        &company_ids,
    ));
    let mut therapeutic_areas: Vec<TherapeuticArea> =
        rows_by_ids::<TherapeuticAreaRow>(storage, &area_ids, |a| a.id.as_str())
            .into_iter()
            .map(TherapeuticArea::from)
            .collect();
    therapeutic_areas.sort_by(|a, b| a.name.cmp(&b.name));

    let mut website = website;
    website.therapeutic_areas = area_ids;

    Some(WebsiteDetail {
        website,
        company,
        products,
        therapeutic_areas,
    })
}

fn find_by_domain_slug(storage: &Storage, key: &str) -> Option<Website> {
    or_log(
        storage.select::<WebsiteRow>(&Select::from::<WebsiteRow>()),
        "websites",
    )
    .into_iter()
    .map(Website::from)
    .find(|w| w.effective_slug() == key)
}
