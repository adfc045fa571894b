//! Directory, diagnostics and flag endpoints.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::header::REFERER;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{not_found, redirect, request_cookies, AppState};
use crate::catalog::{self, CompanyList, Dashboard, Home, ProductList, TherapeuticAreaList, WebsiteList};
use crate::diagnostics::ConnectionReport;
use crate::error::{Error, Result};
use crate::flags::{
    cleared_flag_cookie, flag_cookie, with_flag_param, without_flag_params, Flag, FlagValues,
    COOKIE_DAYS, DEFAULT_FLAG_REDIRECT,
};
use crate::source::SourceKind;

/// Cookie remembering which data source the visitor last selected.
pub const DATA_SOURCE_COOKIE: &str = "use_local_database";

type Params = Query<HashMap<String, String>>;

pub(super) async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "toppharma",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn home(State(state): State<AppState>) -> Result<Json<Home>> {
    state.with_storage(catalog::home).await.map(Json)
}

pub(super) async fn dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>> {
    state.with_storage(catalog::dashboard).await.map(Json)
}

pub(super) async fn companies(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<CompanyList>> {
    state
        .with_storage(move |s| catalog::list_companies(s, &params))
        .await
        .map(Json)
}

pub(super) async fn company(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let detail = state
        .with_storage(move |s| catalog::company_detail(s, &slug))
        .await?;
    Ok(detail.map_or_else(
        || not_found("Company not found", "/companies"),
        |d| Json(d).into_response(),
    ))
}

pub(super) async fn products(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<ProductList>> {
    state
        .with_storage(move |s| catalog::list_products(s, &params))
        .await
        .map(Json)
}

pub(super) async fn product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let detail = state
        .with_storage(move |s| catalog::product_detail(s, &slug))
        .await?;
    Ok(detail.map_or_else(
        || not_found("Product not found", "/products"),
        |d| Json(d).into_response(),
    ))
}

pub(super) async fn websites(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<WebsiteList>> {
    state
        .with_storage(move |s| catalog::list_websites(s, &params))
        .await
        .map(Json)
}

pub(super) async fn website(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let detail = state
        .with_storage(move |s| catalog::website_detail(s, &slug))
        .await?;
    Ok(detail.map_or_else(
        || not_found("Website not found", "/websites"),
        |d| Json(d).into_response(),
    ))
}

pub(super) async fn therapeutic_areas(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<Json<TherapeuticAreaList>> {
    state
        .with_storage(move |s| catalog::list_therapeutic_areas(s, &params))
        .await
        .map(Json)
}

pub(super) async fn therapeutic_area(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let detail = state
        .with_storage(move |s| catalog::therapeutic_area_detail(s, &slug))
        .await?;
    Ok(detail.map_or_else(
        || not_found("Therapeutic area not found", "/therapeutic-areas"),
        |d| Json(d).into_response(),
    ))
}

/// 200 when the connection works, 500 with the same report otherwise.
pub(super) async fn test_db_connection(State(state): State<AppState>) -> Result<Response> {
    let service_key = state.config.admin.service_key.clone();
    let report = state
        .with_storage(move |s| ConnectionReport::run(s, service_key.as_deref()))
        .await?;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(report)).into_response())
}

pub(super) async fn feature_flags(
    State(state): State<AppState>,
    Query(params): Params,
    headers: HeaderMap,
) -> Json<FlagValues> {
    Json(state.flags.resolve(&params, &request_cookies(&headers)))
}

/// Body of a flag toggle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ToggleFlagRequest {
    flag: String,
    #[serde(default)]
    value: Value,
    redirect_url: Option<String>,
}

/// JavaScript-style truthiness of a JSON value.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn redirect_target(url: Option<String>) -> String {
    url.filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_FLAG_REDIRECT.to_string())
}

pub(super) async fn toggle_feature_flag(
    State(state): State<AppState>,
    Json(body): Json<ToggleFlagRequest>,
) -> Result<Response> {
    let flag = Flag::from_str(&body.flag)?;
    let value = truthy(&body.value);
    info!(flag = flag.name(), value, "Toggling feature flag");
    state.flags.set(flag, value)?;

    let location = with_flag_param(&redirect_target(body.redirect_url), flag, value);
    redirect(&location, &[flag_cookie(flag, value, Utc::now())])
}

/// Body of a flag reset.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResetFlagsRequest {
    redirect_url: Option<String>,
}

pub(super) async fn reset_feature_flags(
    State(state): State<AppState>,
    Json(body): Json<ResetFlagsRequest>,
) -> Result<Response> {
    if state.config.server.environment.is_production() {
        return Err(Error::Forbidden(
            "Feature flag resetting is not allowed in production".to_string(),
        ));
    }
    info!("Resetting all feature flags to defaults");
    state.flags.reset()?;

    let cookies: Vec<String> = Flag::ALL.into_iter().map(cleared_flag_cookie).collect();
    let location = without_flag_params(&redirect_target(body.redirect_url));
    redirect(&location, &cookies)
}

/// `Set-Cookie` value recording the selected data source.
fn data_source_cookie(kind: SourceKind, secure: bool) -> String {
    let max_age = COOKIE_DAYS * 24 * 60 * 60;
    let mut cookie = format!(
        "{DATA_SOURCE_COOKIE}={}; path=/; Max-Age={max_age}; SameSite=Lax",
        kind == SourceKind::Database
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Flip between the mock and database sources and go back where the
/// request came from.
pub(super) async fn toggle_data_source(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let target = state.sources.active_kind().toggled();
    state.sources.set_active(target)?;

    let cookie = data_source_cookie(target, state.config.server.environment.is_production());
    let referer = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/");
    redirect(referer, &[cookie])
}
