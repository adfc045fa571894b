//! Landing page summaries.

use serde::Serialize;

use super::{company_refs, or_log};
use crate::model::{
    Company, CompanyRow, Product, ProductRow, ProductStage, TableRow, TherapeuticArea,
    TherapeuticAreaRow, Website, WebsiteRow,
};
use crate::query::{Direction, Select};
use crate::storage::Storage;

const RECENT: u64 = 5;
const FEATURED_COMPANIES: u64 = 3;
const TRENDING_PRODUCTS: u64 = 4;
const RECENT_WEBSITES: u64 = 3;
const HOME_AREAS: u64 = 6;

/// Directory totals. Products count only those on the market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryCounts {
    /// Companies.
    pub companies: u64,
    /// Marketed products.
    pub products: u64,
    /// Websites.
    pub websites: u64,
    /// Therapeutic areas.
    pub therapeutic_areas: u64,
}

impl DirectoryCounts {
    fn load(storage: &Storage) -> Self {
        Self {
            companies: or_log(storage.count(&Select::from::<CompanyRow>()), "company count"),
            products: or_log(
                storage.count(
                    &Select::from::<ProductRow>().eq("stage", ProductStage::Market.as_str()),
                ),
                "product count",
            ),
            websites: or_log(storage.count(&Select::from::<WebsiteRow>()), "website count"),
            therapeutic_areas: or_log(
                storage.count(&Select::from::<TherapeuticAreaRow>()),
                "therapeutic area count",
            ),
        }
    }
}

/// Response of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Directory totals.
    pub counts: DirectoryCounts,
    /// Most recently updated companies.
    pub recent_companies: Vec<Company>,
    /// Most recently updated products.
    pub recent_products: Vec<Product>,
}

/// A marketed product on the home page, with its company's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingProduct {
    /// The product.
    #[serde(flatten)]
    pub product: Product,
    /// Name of the owning company.
    pub company_name: Option<String>,
}

/// Response of the home page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    /// Directory totals.
    pub counts: DirectoryCounts,
    /// First companies by name.
    pub featured_companies: Vec<Company>,
    /// Recently updated marketed products.
    pub trending_products: Vec<TrendingProduct>,
    /// Most recently added websites.
    pub recent_websites: Vec<Website>,
    /// First therapeutic areas by name.
    pub therapeutic_areas: Vec<TherapeuticArea>,
}

fn fetch<R, T>(storage: &Storage, select: &Select, what: &str) -> Vec<T>
where
    R: TableRow,
    T: From<R>,
{
    or_log(storage.select::<R>(select), what)
        .into_iter()
        .map(T::from)
        .collect()
}

/// Totals plus the latest company and product updates.
#[must_use]
pub fn dashboard(storage: &Storage) -> Dashboard {
    Dashboard {
        counts: DirectoryCounts::load(storage),
        recent_companies: fetch::<CompanyRow, _>(
            storage,
            &Select::from::<CompanyRow>()
                .order("updated_at", Direction::Desc)
                .limit(RECENT),
            "recent companies",
        ),
        recent_products: fetch::<ProductRow, _>(
            storage,
            &Select::from::<ProductRow>()
                .order("updated_at", Direction::Desc)
                .limit(RECENT),
            "recent products",
        ),
    }
}

/// The home page summary.
#[must_use]
pub fn home(storage: &Storage) -> Home {
    let trending: Vec<Product> = fetch::<ProductRow, _>(
        storage,
        &Select::from::<ProductRow>()
            .eq("stage", ProductStage::Market.as_str())
            .order("updated_at", Direction::Desc)
            .limit(TRENDING_PRODUCTS),
        "trending products",
    );
    let mut company_ids: Vec<String> = Vec::new();
    for id in trending.iter().filter_map(|p| p.company_id.as_ref()) {
        if !company_ids.contains(id) {
            company_ids.push(id.clone());
        }
    }
    let companies = company_refs(storage, &company_ids);
    let trending_products = trending
        .into_iter()
        .map(|product| TrendingProduct {
            company_name: product
                .company_id
                .as_ref()
                .and_then(|id| companies.get(id))
                .map(|c| c.name.clone()),
            product,
        })
        .collect();

    Home {
        counts: DirectoryCounts::load(storage),
        featured_companies: fetch::<CompanyRow, _>(
            storage,
            &Select::from::<CompanyRow>()
                .order("name", Direction::Asc)
                .limit(FEATURED_COMPANIES),
            "featured companies",
        ),
        trending_products,
        recent_websites: fetch::<WebsiteRow, _>(
            storage,
            &Select::from::<WebsiteRow>()
                .order("created_at", Direction::Desc)
                .limit(RECENT_WEBSITES),
            "recent websites",
        ),
        therapeutic_areas: fetch::<TherapeuticAreaRow, _>(
            storage,
            &Select::from::<TherapeuticAreaRow>()
                .order("name", Direction::Asc)
                .limit(HOME_AREAS),
            "therapeutic areas",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::seeded;

    #[test]
    fn test_counts_only_marketed_products() {
        let counts = DirectoryCounts::load(&seeded());
        assert_eq!(
            counts,
            DirectoryCounts {
                companies: 4,
                products: 9,
                websites: 5,
                therapeutic_areas: 5,
            }
        );
    }

    #[test]
    fn test_dashboard_recent_updates() {
        let dashboard = dashboard(&seeded());
        let companies: Vec<_> = dashboard.recent_companies.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(companies, vec!["novartis", "pfizer", "roche", "merck"]);
        let products: Vec<_> = dashboard.recent_products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            products,
            vec!["pelacarsen", "product1", "kisqali", "keytruda", "tecentriq"]
        );
    }

    #[test]
    fn test_home() {
        let home = home(&seeded());
        let featured: Vec<_> = home.featured_companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(featured, vec!["Merck", "Novartis", "Pfizer"]);

        let trending: Vec<_> = home
            .trending_products
            .iter()
            .map(|t| (t.product.id.as_str(), t.company_name.as_deref()))
            .collect();
        assert_eq!(
            trending,
            vec![
                ("product1", Some("Pfizer")),
                ("kisqali", Some("Novartis")),
                ("keytruda", Some("Merck")),
                ("tecentriq", Some("Roche")),
            ]
        );

        let websites: Vec<_> = home.recent_websites.iter().map(|w| w.domain.as_str()).collect();
        assert_eq!(websites, vec!["keytruda.com", "pfizer.com", "comirnaty.com"]);
        assert_eq!(home.therapeutic_areas.len(), 5);
    }

    #[test]
    fn test_empty_directory() {
        let storage = Storage::open_in_memory().unwrap();
        let home = home(&storage);
        assert_eq!(home.counts, DirectoryCounts::default());
        assert!(home.trending_products.is_empty());

        let json = serde_json::to_value(&home).unwrap();
        assert_eq!(json["counts"]["therapeuticAreas"], 0);
    }
}
