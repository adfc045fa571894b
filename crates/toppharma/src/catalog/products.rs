//! Product list and detail.

use std::collections::HashMap;

use serde::Serialize;

use super::params::contains_pattern;
use super::{
    all_areas, area_names, area_options, company_options, company_refs, find_by_slug_or_id,
    group_by_left, left_ids, links, names_for, options, or_log, rank_by_count, right_ids,
    rows_by_ids, CompanyRef, ListParams, SelectOption,
};
use crate::model::{
    Company, CompanyRow, Product, ProductRow, ProductStage, TherapeuticArea, TherapeuticAreaRow,
    Website, WebsiteRow,
};
use crate::query::{Page, PageInfo, Select};
use crate::storage::{Relation, Side, Storage};

/// Related products shown on a product page.
pub const RELATED_PRODUCTS: usize = 4;

const SORT_OPTIONS: &[(&str, &str)] = &[
    ("name_asc", "Name (A to Z)"),
    ("name_desc", "Name (Z to A)"),
    ("stage_asc", "Stage (Early to Late)"),
    ("stage_desc", "Stage (Late to Early)"),
    ("company_asc", "Company (A to Z)"),
    ("company_desc", "Company (Z to A)"),
];

/// A product in the list, with its company and therapeutic area names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    /// The product.
    #[serde(flatten)]
    pub product: Product,
    /// The owning company, when known.
    pub company: Option<CompanyRef>,
    /// Names of the product's therapeutic areas.
    pub therapeutic_area_names: Vec<String>,
}

/// Filter and sort choices offered with the product list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilterOptions {
    /// Companies ordered by name.
    pub companies: Vec<SelectOption>,
    /// Therapeutic areas ordered by name.
    pub therapeutic_areas: Vec<SelectOption>,
    /// Development stages.
    pub stages: Vec<SelectOption>,
    /// Sort orders.
    pub sort_options: Vec<SelectOption>,
}

/// Response of the product list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    /// Products on this page.
    pub products: Vec<ProductListItem>,
    /// Page metadata.
    pub pagination: PageInfo,
    /// Sort in effect, as `<field>_<direction>`.
    pub sort: String,
    /// Filter choices.
    pub filters: ProductFilterOptions,
}

fn stage_options() -> Vec<SelectOption> {
    ProductStage::ALL
        .iter()
        .map(|s| SelectOption::new(s.as_str(), s.display_name()))
        .collect()
}

/// List products.
///
/// Parameters: `search` (name substring), `companies` (company ids),
/// `stages`, `tas` (therapeutic area ids, any match), `sort` over
/// `name`, `stage` or `company`, and `page`/`limit`. Sorting by company
/// orders by company name and pages in memory.
#[must_use]
pub fn list_products(storage: &Storage, query: &HashMap<String, String>) -> ProductList {
    let params = ListParams::new(query);
    let sort = params.sort("name_asc");
    let pagination = params.pagination();

    let mut select = Select::from::<ProductRow>();
    if let Some(search) = params.text("search") {
        select = select.ilike("name", contains_pattern(search));
    }
    let companies = params.list("companies");
    if !companies.is_empty() {
        select = select.in_list("company_id", companies);
    }
    let stages = params.list("stages");
    if !stages.is_empty() {
        select = select.in_list("stage", stages);
    }
    let tas = params.list("tas");
    if !tas.is_empty() {
        let ids = left_ids(&links(storage, Relation::ProductTherapeuticArea, Side::Right, &tas));
        select = select.in_list("id", ids);
    }

    let (rows, total) = if sort.field == "company" {
        let mut rows = or_log(storage.select::<ProductRow>(&select), "products");
        let names = company_refs(storage, &distinct_company_ids(&rows));
        rows.sort_by(|a, b| {
            let name_of = |p: &ProductRow| {
                p.company_id
                    .as_ref()
                    .and_then(|id| names.get(id))
                    .map(|c| c.name.clone())
                    .unwrap_or_default()
            };
            sort.direction.apply(name_of(a).cmp(&name_of(b)))
        });
        let page = Page::from_vec(rows, pagination);
        (page.data, page.pagination.total)
    } else {
        let total = or_log(storage.count(&select), "products");
        match sort.field.as_str() {
            "name" | "stage" => select = select.order(&sort.field, sort.direction),
            _ => {}
        }
        let (start, end) = pagination.range();
        let rows = or_log(storage.select::<ProductRow>(&select.range(start, end)), "products");
        (rows, total)
    };

    let areas = all_areas(storage);
    let area_name_map = area_names(&areas);
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let area_ids = group_by_left(&links(storage, Relation::ProductTherapeuticArea, Side::Left, &ids));
    let companies = company_refs(storage, &distinct_company_ids(&rows));

    let products = rows
        .into_iter()
        .map(|row| {
            let mut product = Product::from(row);
            product.therapeutic_areas = area_ids.get(&product.id).cloned().unwrap_or_default();
            let company = product
                .company_id
                .as_ref()
                .and_then(|id| companies.get(id))
                .cloned();
            let therapeutic_area_names = names_for(&product.therapeutic_areas, &area_name_map);
            ProductListItem {
                product,
                company,
                therapeutic_area_names,
            }
        })
        .collect();

    ProductList {
        products,
        pagination: PageInfo::new(total, pagination),
        sort: sort.to_param(),
        filters: ProductFilterOptions {
            companies: company_options(storage),
            therapeutic_areas: area_options(&areas),
            stages: stage_options(),
            sort_options: options(SORT_OPTIONS),
        },
    }
}

fn distinct_company_ids(rows: &[ProductRow]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in rows.iter().filter_map(|r| r.company_id.as_ref()) {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}

/// Response of the product detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    /// The product.
    pub product: Product,
    /// The owning company.
    pub company: Option<Company>,
    /// The product's therapeutic areas.
    pub therapeutic_areas: Vec<TherapeuticArea>,
    /// Websites featuring the product.
    pub websites: Vec<Website>,
    /// Products sharing the most therapeutic areas.
    pub related_products: Vec<Product>,
}

/// Product detail by slug, falling back to id.
#[must_use]
pub fn product_detail(storage: &Storage, key: &str) -> Option<ProductDetail> {
    let row = find_by_slug_or_id::<ProductRow>(storage, key)?;
    let mut product = Product::from(row);
    let id = vec![product.id.clone()];

    let company = product.company_id.as_ref().and_then(|company_id| {
        or_log(
            storage.first::<CompanyRow>(Select::from::<CompanyRow>().eq("id", company_id)),
            "product company",
        )
        .map(Company::from)
    });

    let area_ids = right_ids(&links(storage, Relation::ProductTherapeuticArea, Side::Left, &id));
    let therapeutic_areas = rows_by_ids::<TherapeuticAreaRow>(storage, &area_ids, |a| a.id.as_str())
        .into_iter()
        .map(TherapeuticArea::from)
        .collect();
    product.therapeutic_areas.clone_from(&area_ids);

    let website_ids = right_ids(&links(storage, Relation::ProductWebsite, Side::Left, &id));
    let websites = rows_by_ids::<WebsiteRow>(storage, &website_ids, |w| w.id.as_str())
        .into_iter()
        .map(Website::from)
        .collect();

    let related_products = related_products(storage, &product.id, &area_ids);

    Some(ProductDetail {
        product,
        company,
        therapeutic_areas,
        websites,
        related_products,
    })
}

/// Other products ranked by the number of therapeutic areas they share
/// with `product_id`.
fn related_products(storage: &Storage, product_id: &str, area_ids: &[String]) -> Vec<Product> {
    let sharing: Vec<String> = links(storage, Relation::ProductTherapeuticArea, Side::Right, area_ids)
        .into_iter()
        .filter(|l| l.left != product_id)
        .map(|l| l.left)
        .collect();
    let ranked: Vec<String> = rank_by_count(sharing, RELATED_PRODUCTS)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    rows_by_ids::<ProductRow>(storage, &ranked, |p| p.id.as_str())
        .into_iter()
        .map(Product::from)
        .collect()
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

    fn names(list: &ProductList) -> Vec<&str> {
        list.products.iter().map(|p| p.product.name.as_str()).collect()
    }

    #[test]
    fn test_filter_by_company_and_stage() {
        let list = list_products(
            &seeded(),
            &query(&[("companies", "novartis"), ("stages", "market")]),
        );
        assert_eq!(names(&list), vec!["Cosentyx", "Entresto", "Kisqali"]);

        let list = list_products(&seeded(), &query(&[("stages", "phase3")]));
        assert_eq!(names(&list), vec!["Pelacarsen"]);
    }

    #[test]
    fn test_filter_by_therapeutic_area() {
        let list = list_products(&seeded(), &query(&[("tas", "vaccines")]));
        assert_eq!(names(&list), vec!["Comirnaty", "Gardasil"]);
    }

    #[test]
    fn test_sort_by_company_name() {
        let list = list_products(
            &seeded(),
            &query(&[("sort", "company_desc"), ("tas", "oncology")]),
        );
        let companies: Vec<_> = list
            .products
            .iter()
            .map(|p| p.company.as_ref().unwrap().name.as_str())
            .collect();
        let mut expected = companies.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(companies, expected);
        assert_eq!(companies.first(), Some(&"Roche"));
        assert_eq!(list.pagination.total, 4);
    }

    #[test]
    fn test_sort_by_company_paginates() {
        let list = list_products(
            &seeded(),
            &query(&[("sort", "company_asc"), ("limit", "2"), ("page", "1")]),
        );
        assert_eq!(list.products.len(), 2);
        assert_eq!(list.pagination.total, 10);
        assert_eq!(list.pagination.pages, 5);
        assert!(list
            .products
            .iter()
            .all(|p| p.company.as_ref().unwrap().name == "Merck"));
    }

    #[test]
    fn test_items_carry_company_and_areas() {
        let list = list_products(&seeded(), &query(&[("search", "keytruda")]));
        let item = &list.products[0];
        assert_eq!(item.company.as_ref().unwrap().id, "merck");
        let mut areas = item.therapeutic_area_names.clone();
        areas.sort();
        assert_eq!(areas, vec!["Immunology", "Oncology"]);
        assert_eq!(list.filters.stages.len(), 8);
    }

    #[test]
    fn test_empty_search() {
        let list = list_products(&seeded(), &query(&[("search", "nothing-here")]));
        assert!(list.products.is_empty());
        assert_eq!(list.pagination.pages, 0);
    }

    #[test]
    fn test_product_detail() {
        let detail = product_detail(&seeded(), "keytruda").unwrap();
        assert_eq!(detail.company.as_ref().unwrap().name, "Merck");
        assert_eq!(detail.therapeutic_areas.len(), 2);
        assert_eq!(detail.websites.len(), 1);
        assert_eq!(detail.websites[0].domain, "keytruda.com");

        // tecentriq shares both oncology and immunology with keytruda
        assert_eq!(detail.related_products.len(), RELATED_PRODUCTS);
        assert_eq!(detail.related_products[0].id, "tecentriq");
        assert!(detail.related_products.iter().all(|p| p.id != "keytruda"));
    }

    #[test]
    fn test_product_detail_by_id() {
        let detail = product_detail(&seeded(), "product1").unwrap();
        assert_eq!(detail.product.slug, "comirnaty");
        assert_eq!(detail.websites.len(), 2);
        let related: Vec<_> = detail.related_products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(related, vec!["gardasil"]);
    }

    #[test]
    fn test_product_detail_unknown() {
        assert!(product_detail(&seeded(), "ghost").is_none());
    }
}
