//! Data source backed by the `SQLite` store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use super::{DataSource, SourceKind};
use crate::error::{Error, Result};
use crate::model::{
    Company, CompanyRow, Product, ProductRow, TableRow, TherapeuticArea, TherapeuticAreaRow,
    Website, WebsiteRow,
};
use crate::query::{column_name, FilterValue, Page, QueryOptions, Select};
use crate::storage::{Link, Relation, Side, Storage};

/// A storage handle shared between the server and data sources.
pub type SharedStorage = Arc<Mutex<Storage>>;

/// Field that filters through a join table rather than a column.
const THERAPEUTIC_AREAS_FIELD: &str = "therapeuticAreas";

/// Run `f` against the locked storage on tokio's blocking pool.
///
/// The lock is taken and released inside the blocking task, so async
/// workers never wait on `SQLite` or on the mutex.
///
/// # Errors
///
/// Returns an error if the storage lock is poisoned or the blocking task
/// panics.
pub async fn run_blocking<T, F>(storage: &SharedStorage, f: F) -> Result<T>
where
    F: FnOnce(&Storage) -> T + Send + 'static,
    T: Send + 'static,
{
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || {
        let guard = storage
            .lock()
            .map_err(|_| Error::internal("storage lock poisoned"))?;
        Ok(f(&guard))
    })
    .await
    .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
}

/// Reads entities from the database.
#[derive(Debug, Clone)]
pub struct DatabaseSource {
    storage: SharedStorage,
}

impl DatabaseSource {
    /// Wrap a shared storage handle.
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    async fn query<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.storage, f).await?
    }
}

/// How a `therapeuticAreas` filter reaches a table.
#[derive(Debug, Clone, Copy)]
enum AreaJoin {
    /// The table has its own link table to therapeutic areas.
    Direct(Relation),
    /// Rows inherit the areas of their owning company.
    ViaCompany,
}

/// Apply the option filters to a select.
///
/// `join` says how a `therapeuticAreas` filter is resolved; tables without
/// one reject the field like any other unknown column.
fn filtered(
    storage: &Storage,
    base: Select,
    options: &QueryOptions,
    join: Option<AreaJoin>,
) -> Result<Select> {
    let mut select = base;
    for (field, value) in &options.filters {
        if field == THERAPEUTIC_AREAS_FIELD {
            if let Some(join) = join {
                let areas = filter_values(value);
                select = match join {
                    AreaJoin::Direct(relation) => {
                        let ids = left_ids(&storage.links_for(relation, Side::Right, &areas)?);
                        select.in_list("id", ids)
                    }
                    AreaJoin::ViaCompany => {
                        let companies = left_ids(&storage.links_for(
                            Relation::CompanyTherapeuticArea,
                            Side::Right,
                            &areas,
                        )?);
                        select.in_list("company_id", companies)
                    }
                };
                continue;
            }
        }
        select = select.filter(value.to_filter(&column_name(field)));
    }
    Ok(select)
}

fn filter_values(value: &FilterValue) -> Vec<String> {
    match value {
        FilterValue::List(items) => items.clone(),
        FilterValue::Text(text) => vec![text.clone()],
        FilterValue::Number(n) => vec![n.to_string()],
        FilterValue::Bool(b) => vec![b.to_string()],
    }
}

fn left_ids(links: &[Link]) -> Vec<String> {
    let mut ids: Vec<String> = links.iter().map(|l| l.left.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Run a filtered, ordered and ranged select.
fn paged<R: TableRow>(
    storage: &Storage,
    base: Select,
    options: &QueryOptions,
    join: Option<AreaJoin>,
) -> Result<(Vec<R>, u64)> {
    let select = filtered(storage, base, options, join)?;
    let total = storage.count(&select)?;

    let mut select = select;
    if let Some(sort) = &options.sort {
        select = select.order(&column_name(&sort.field), sort.direction);
    }
    let (start, end) = options.pagination_or_default().range();
    let rows = storage.select::<R>(&select.range(start, end))?;
    debug!(table = R::TABLE, total, returned = rows.len(), "paged select");
    Ok((rows, total))
}

/// Group join rows by their left id.
fn group_links(links: Vec<Link>) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for link in links {
        grouped.entry(link.left).or_default().push(link.right);
    }
    grouped
}

fn companies_with_areas(storage: &Storage, rows: Vec<CompanyRow>) -> Result<Vec<Company>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut areas = group_links(storage.links_for(
        Relation::CompanyTherapeuticArea,
        Side::Left,
        &ids,
    )?);
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut company = Company::from(row);
            company.therapeutic_areas = areas.remove(&company.id).unwrap_or_default();
            company
        })
        .collect())
}

fn products_with_areas(storage: &Storage, rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut areas = group_links(storage.links_for(
        Relation::ProductTherapeuticArea,
        Side::Left,
        &ids,
    )?);
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut product = Product::from(row);
            product.therapeutic_areas = areas.remove(&product.id).unwrap_or_default();
            product
        })
        .collect())
}

/// Websites carry the therapeutic areas of their owning company.
fn websites_with_areas(storage: &Storage, rows: Vec<WebsiteRow>) -> Result<Vec<Website>> {
    let company_ids: Vec<String> = rows.iter().filter_map(|r| r.company_id.clone()).collect();
    let areas = group_links(storage.links_for(
        Relation::CompanyTherapeuticArea,
        Side::Left,
        &company_ids,
    )?);
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut website = Website::from(row);
            if let Some(ids) = website.company_id.as_ref().and_then(|id| areas.get(id)) {
                website.therapeutic_areas.clone_from(ids);
            }
            website
        })
        .collect())
}

#[async_trait::async_trait]
impl DataSource for DatabaseSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Database
    }

    fn name(&self) -> &'static str {
        "SQLite database"
    }

    async fn health_check(&self) -> bool {
        match self.query(|storage| storage.count_table("companies")).await {
            Ok(_) => true,
            Err(e) => {
                error!("Database health check failed: {}", e);
                false
            }
        }
    }

    async fn company_by_id(&self, id: &str) -> Result<Option<Company>> {
        let id = id.to_string();
        self.query(move |storage| {
            match storage.first::<CompanyRow>(Select::from::<CompanyRow>().eq("id", id))? {
                Some(row) => Ok(companies_with_areas(storage, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn companies(&self, options: &QueryOptions) -> Result<Page<Company>> {
        let options = options.clone();
        self.query(move |storage| {
            let (rows, total) = paged::<CompanyRow>(
                storage,
                Select::from::<CompanyRow>(),
                &options,
                Some(AreaJoin::Direct(Relation::CompanyTherapeuticArea)),
            )?;
            let data = companies_with_areas(storage, rows)?;
            Ok(Page::new(data, total, options.pagination_or_default()))
        })
        .await
    }

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>> {
        let id = id.to_string();
        self.query(move |storage| {
            match storage.first::<ProductRow>(Select::from::<ProductRow>().eq("id", id))? {
                Some(row) => Ok(products_with_areas(storage, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn products(&self, options: &QueryOptions) -> Result<Page<Product>> {
        let options = options.clone();
        self.query(move |storage| {
            let (rows, total) = paged::<ProductRow>(
                storage,
                Select::from::<ProductRow>(),
                &options,
                Some(AreaJoin::Direct(Relation::ProductTherapeuticArea)),
            )?;
            let data = products_with_areas(storage, rows)?;
            Ok(Page::new(data, total, options.pagination_or_default()))
        })
        .await
    }

    async fn products_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<Product>> {
        let company_id = company_id.to_string();
        let options = options.clone();
        self.query(move |storage| {
            let (rows, total) = paged::<ProductRow>(
                storage,
                Select::from::<ProductRow>().eq("company_id", company_id),
                &options,
                Some(AreaJoin::Direct(Relation::ProductTherapeuticArea)),
            )?;
            let data = products_with_areas(storage, rows)?;
            Ok(Page::new(data, total, options.pagination_or_default()))
        })
        .await
    }

    async fn website_by_id(&self, id: &str) -> Result<Option<Website>> {
        let id = id.to_string();
        self.query(move |storage| {
            match storage.first::<WebsiteRow>(Select::from::<WebsiteRow>().eq("id", id))? {
                Some(row) => Ok(websites_with_areas(storage, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn websites(&self, options: &QueryOptions) -> Result<Page<Website>> {
        let options = options.clone();
        self.query(move |storage| {
            let (rows, total) = paged::<WebsiteRow>(
                storage,
                Select::from::<WebsiteRow>(),
                &options,
                Some(AreaJoin::ViaCompany),
            )?;
            let data = websites_with_areas(storage, rows)?;
            Ok(Page::new(data, total, options.pagination_or_default()))
        })
        .await
    }

    async fn websites_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<Website>> {
        let company_id = company_id.to_string();
        let options = options.clone();
        self.query(move |storage| {
            let (rows, total) = paged::<WebsiteRow>(
                storage,
                Select::from::<WebsiteRow>().eq("company_id", company_id),
                &options,
                Some(AreaJoin::ViaCompany),
            )?;
            let data = websites_with_areas(storage, rows)?;
            Ok(Page::new(data, total, options.pagination_or_default()))
        })
        .await
    }

    async fn therapeutic_area_by_id(&self, id: &str) -> Result<Option<TherapeuticArea>> {
        let id = id.to_string();
        self.query(move |storage| {
            let row = storage.first::<TherapeuticAreaRow>(
                Select::from::<TherapeuticAreaRow>().eq("id", id),
            )?;
            Ok(row.map(TherapeuticArea::from))
        })
        .await
    }

    async fn therapeutic_areas(&self, options: &QueryOptions) -> Result<Page<TherapeuticArea>> {
        let options = options.clone();
        self.query(move |storage| {
            let (rows, total) = paged::<TherapeuticAreaRow>(
                storage,
                Select::from::<TherapeuticAreaRow>(),
                &options,
                None,
            )?;
            let data = rows.into_iter().map(TherapeuticArea::from).collect();
            Ok(Page::new(data, total, options.pagination_or_default()))
        })
        .await
    }

    async fn therapeutic_areas_for_company(
        &self,
        company_id: &str,
        options: &QueryOptions,
    ) -> Result<Page<TherapeuticArea>> {
        let company_id = company_id.to_string();
        let options = options.clone();
        self.query(move |storage| {
            let links =
                storage.links_for(Relation::CompanyTherapeuticArea, Side::Left, &[company_id])?;
            let area_ids: Vec<String> = links.into_iter().map(|l| l.right).collect();
            let (rows, total) = paged::<TherapeuticAreaRow>(
                storage,
                Select::from::<TherapeuticAreaRow>().in_list("id", area_ids),
                &options,
                None,
            )?;
            let data = rows.into_iter().map(TherapeuticArea::from).collect();
            Ok(Page::new(data, total, options.pagination_or_default()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::query::Direction;
    use crate::source::MockSource;

    fn seeded() -> DatabaseSource {
        let storage = Storage::open_in_memory().unwrap();
        storage.import(&Dataset::demo()).unwrap();
        DatabaseSource::new(Arc::new(Mutex::new(storage)))
    }

    #[tokio::test]
    async fn test_health_check() {
        assert!(seeded().health_check().await);
    }

    #[tokio::test]
    async fn test_company_by_id_fills_areas() {
        let source = seeded();
        let pfizer = source.company_by_id("pfizer").await.unwrap().unwrap();
        assert_eq!(pfizer.name, "Pfizer");
        let mut areas = pfizer.therapeutic_areas.clone();
        areas.sort();
        assert_eq!(areas, vec!["immunology", "oncology", "vaccines"]);

        assert!(source.company_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_companies_sorted_and_paged() {
        let source = seeded();
        let options = QueryOptions::default()
            .sort("marketCap", Direction::Desc)
            .page(1, 2);
        let page = source.companies(&options).await.unwrap();

        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.pagination.pages, 2);
        let names: Vec<_> = page.data.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Roche", "Pfizer"]);
    }

    #[tokio::test]
    async fn test_count_uses_filters() {
        let source = seeded();
        let options = QueryOptions::default()
            .filter("headquarters", FilterValue::Text("%Switzerland%".into()))
            .page(1, 1);
        let page = source.companies(&options).await.unwrap();
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.data.len(), 1);
    }

    #[tokio::test]
    async fn test_therapeutic_area_filter_uses_join() {
        let source = seeded();
        let options = QueryOptions::default()
            .filter(THERAPEUTIC_AREAS_FIELD, FilterValue::Text("vaccines".into()))
            .sort("name", Direction::Asc);
        let page = source.companies(&options).await.unwrap();
        let ids: Vec<_> = page.data.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["merck", "pfizer"]);
    }

    #[tokio::test]
    async fn test_unknown_filter_field_is_rejected() {
        let source = seeded();
        let options =
            QueryOptions::default().filter("ceo", FilterValue::Text("Albert Bourla".into()));
        let err = source.companies(&options).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_products_for_company() {
        let source = seeded();
        let options = QueryOptions::default().sort("name", Direction::Asc);
        let page = source
            .products_for_company("merck", &options)
            .await
            .unwrap();
        let names: Vec<_> = page.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Gardasil", "Keytruda"]);
        assert!(page.data[1].therapeutic_areas.contains(&"oncology".to_string()));
    }

    #[tokio::test]
    async fn test_websites_for_company() {
        let source = seeded();
        let page = source
            .websites_for_company("pfizer", &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_therapeutic_areas_for_company() {
        let source = seeded();
        let options = QueryOptions::default().sort("name", Direction::Asc);
        let page = source
            .therapeutic_areas_for_company("roche", &options)
            .await
            .unwrap();
        let names: Vec<_> = page.data.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Immunology", "Neuroscience", "Oncology"]);
    }

    #[tokio::test]
    async fn test_empty_search_returns_empty_page() {
        let source = seeded();
        let options =
            QueryOptions::default().filter("name", FilterValue::Text("%zzzz%".into()));
        let page = source.products(&options).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.pages, 0);
    }

    #[tokio::test]
    async fn test_websites_carry_company_areas_like_mock() {
        let database = seeded();
        let mock = MockSource::default();
        let options = QueryOptions::default().sort("domain", Direction::Asc);

        let from_db = database.websites(&options).await.unwrap();
        let from_mock = mock.websites(&options).await.unwrap();
        assert_eq!(from_db.data.len(), from_mock.data.len());
        for (db, mem) in from_db.data.iter().zip(&from_mock.data) {
            assert_eq!(db.id, mem.id);
            let mut db_areas = db.therapeutic_areas.clone();
            let mut mem_areas = mem.therapeutic_areas.clone();
            db_areas.sort();
            mem_areas.sort();
            assert_eq!(db_areas, mem_areas, "{}", db.id);
        }

        let keytruda = database.website_by_id("keytruda-com").await.unwrap().unwrap();
        assert!(keytruda.therapeutic_areas.contains(&"vaccines".to_string()));
    }

    #[tokio::test]
    async fn test_website_area_filter_goes_through_company() {
        let source = seeded();
        let options = QueryOptions::default()
            .filter(THERAPEUTIC_AREAS_FIELD, FilterValue::Text("neuroscience".into()))
            .sort("domain", Direction::Asc);
        let page = source.websites(&options).await.unwrap();
        let ids: Vec<_> = page.data.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["novartis-com", "roche-com"]);
    }

    #[tokio::test]
    async fn test_null_sort_keys_order_last() {
        let source = seeded();
        for direction in [Direction::Asc, Direction::Desc] {
            let options = QueryOptions::default().sort("year", direction).page(1, 20);
            let page = source.products(&options).await.unwrap();
            let years: Vec<_> = page.data.iter().map(|p| p.year).collect();

            assert_eq!(years.len(), 10);
            assert_eq!(page.data.last().unwrap().id, "pelacarsen", "{direction}");
            assert!(years[..9].iter().all(Option::is_some), "{direction}");
        }

        let options = QueryOptions::default().sort("year", Direction::Desc).page(1, 2);
        let page = source.products(&options).await.unwrap();
        assert_eq!(page.data[0].id, "product1");
        assert_eq!(page.data[0].year, Some(2021));
    }
}
