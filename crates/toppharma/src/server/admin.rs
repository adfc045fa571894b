//! Admin endpoints: data-source inspection, feed diagnostics and audits.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::{not_found, AppState};
use crate::diagnostics::FeedReport;
use crate::error::Result;
use crate::model::{Company, Product, TherapeuticArea, Website};
use crate::query::{Direction, Page, QueryOptions};
use crate::source::{DataSource, SourceKind};

/// Companies listed by the company audit.
const AUDIT_SAMPLE: u32 = 10;

type Params = Query<HashMap<String, String>>;

fn source_for(state: &AppState, kind: &str) -> Result<Arc<dyn DataSource>> {
    let kind: SourceKind = kind.parse()?;
    state.sources.get(kind)
}

fn list_path(kind: &str, entity: &str) -> String {
    format!("/admin/data-sources/{kind}/{entity}")
}

/// Registered sources with their health, and which one is active.
pub(super) async fn data_sources(State(state): State<AppState>) -> Result<Json<Value>> {
    let active = state.sources.active_kind();
    let mut sources = Vec::new();
    for kind in state.sources.kinds() {
        let source = state.sources.get(kind)?;
        let healthy = source.health_check().await;
        sources.push(json!({
            "kind": kind,
            "name": source.name(),
            "healthy": healthy,
            "active": kind == active,
        }));
    }
    Ok(Json(json!({ "active": active, "sources": sources })))
}

pub(super) async fn source_companies(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Params,
) -> Result<Json<Page<Company>>> {
    let source = source_for(&state, &kind)?;
    let options = QueryOptions::from_params(&params);
    source.companies(&options).await.map(Json)
}

/// One company with its products, websites and areas, all read through the
/// chosen source.
pub(super) async fn source_company(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response> {
    let source = source_for(&state, &kind)?;
    let Some(company) = source.company_by_id(&id).await? else {
        return Ok(not_found("Company not found", &list_path(&kind, "companies")));
    };
    let options = QueryOptions::default();
    let products = source.products_for_company(&id, &options).await?;
    let websites = source.websites_for_company(&id, &options).await?;
    let therapeutic_areas = source.therapeutic_areas_for_company(&id, &options).await?;
    Ok(Json(json!({
        "company": company,
        "products": products,
        "websites": websites,
        "therapeuticAreas": therapeutic_areas,
    }))
    .into_response())
}

pub(super) async fn source_products(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Params,
) -> Result<Json<Page<Product>>> {
    let source = source_for(&state, &kind)?;
    let options = QueryOptions::from_params(&params);
    source.products(&options).await.map(Json)
}

pub(super) async fn source_product(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response> {
    let source = source_for(&state, &kind)?;
    Ok(match source.product_by_id(&id).await? {
        Some(product) => Json(product).into_response(),
        None => not_found("Product not found", &list_path(&kind, "products")),
    })
}

pub(super) async fn source_websites(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Params,
) -> Result<Json<Page<Website>>> {
    let source = source_for(&state, &kind)?;
    let options = QueryOptions::from_params(&params);
    source.websites(&options).await.map(Json)
}

pub(super) async fn source_website(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response> {
    let source = source_for(&state, &kind)?;
    Ok(match source.website_by_id(&id).await? {
        Some(website) => Json(website).into_response(),
        None => not_found("Website not found", &list_path(&kind, "websites")),
    })
}

pub(super) async fn source_therapeutic_areas(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Params,
) -> Result<Json<Page<TherapeuticArea>>> {
    let source = source_for(&state, &kind)?;
    let options = QueryOptions::from_params(&params);
    source.therapeutic_areas(&options).await.map(Json)
}

pub(super) async fn source_therapeutic_area(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response> {
    let source = source_for(&state, &kind)?;
    Ok(match source.therapeutic_area_by_id(&id).await? {
        Some(area) => Json(area).into_response(),
        None => not_found(
            "Therapeutic area not found",
            &list_path(&kind, "therapeutic-areas"),
        ),
    })
}

pub(super) async fn feed_connection_test(State(state): State<AppState>) -> Result<Json<FeedReport>> {
    let report = state.with_storage(FeedReport::run).await??;
    Ok(Json(report))
}

/// Company count and a sample read through the active source.
pub(super) async fn audit_companies(State(state): State<AppState>) -> Result<Json<Value>> {
    let source = state.sources.active()?;
    let options = QueryOptions::default()
        .sort("name", Direction::Asc)
        .page(1, AUDIT_SAMPLE);
    let page = source.companies(&options).await?;
    Ok(Json(json!({
        "companyCount": page.pagination.total,
        "dataSource": source.name(),
        "activeSource": source.kind(),
        "companies": page.data,
    })))
}
