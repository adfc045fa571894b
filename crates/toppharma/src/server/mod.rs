//! HTTP API server.
//!
//! Directory pages, diagnostics and flag endpoints are served as JSON by
//! axum. Handlers share one [`AppState`]; the database connection sits
//! behind a mutex that is only taken on tokio's blocking pool, for the
//! duration of one synchronous catalog call.

mod admin;
mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::flags::{parse_cookies, FeatureFlags};
use crate::source::{run_blocking, DatabaseSource, MockSource, SharedStorage, SourceRegistry};
use crate::storage::Storage;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The directory database.
    pub storage: SharedStorage,
    /// Registered data sources.
    pub sources: Arc<SourceRegistry>,
    /// Feature flags.
    pub flags: Arc<FeatureFlags>,
    /// Loaded configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the state: registers the mock and database sources, activates
    /// the configured default and loads flag defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be registered.
    pub fn new(config: Config, storage: Storage) -> Result<Self> {
        let storage: SharedStorage = Arc::new(Mutex::new(storage));
        let sources = SourceRegistry::new(config.default_source());
        sources.register(Arc::new(MockSource::default()))?;
        sources.register(Arc::new(DatabaseSource::new(Arc::clone(&storage))))?;
        let flags = FeatureFlags::new(&config.flags);
        Ok(Self {
            storage,
            sources: Arc::new(sources),
            flags: Arc::new(flags),
            config: Arc::new(config),
        })
    }

    /// Run `f` with the locked database on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage lock is poisoned or the task fails.
    pub async fn with_storage<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Storage) -> T + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.storage, f).await
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/home", get(handlers::home))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/companies", get(handlers::companies))
        .route("/api/companies/:slug", get(handlers::company))
        .route("/api/products", get(handlers::products))
        .route("/api/products/:slug", get(handlers::product))
        .route("/api/websites", get(handlers::websites))
        .route("/api/websites/:slug", get(handlers::website))
        .route("/api/therapeutic-areas", get(handlers::therapeutic_areas))
        .route("/api/therapeutic-areas/:slug", get(handlers::therapeutic_area))
        .route("/api/test-db-connection", get(handlers::test_db_connection))
        .route("/api/feature-flags", get(handlers::feature_flags))
        .route("/api/toggle-feature-flag", post(handlers::toggle_feature_flag))
        .route("/api/reset-feature-flags", post(handlers::reset_feature_flags))
        .route("/api/toggle-data-source", post(handlers::toggle_data_source))
        .route("/admin/data-sources", get(admin::data_sources))
        .route("/admin/data-sources/:kind/companies", get(admin::source_companies))
        .route("/admin/data-sources/:kind/companies/:id", get(admin::source_company))
        .route("/admin/data-sources/:kind/products", get(admin::source_products))
        .route("/admin/data-sources/:kind/products/:id", get(admin::source_product))
        .route("/admin/data-sources/:kind/websites", get(admin::source_websites))
        .route("/admin/data-sources/:kind/websites/:id", get(admin::source_website))
        .route(
            "/admin/data-sources/:kind/therapeutic-areas",
            get(admin::source_therapeutic_areas),
        )
        .route(
            "/admin/data-sources/:kind/therapeutic-areas/:id",
            get(admin::source_therapeutic_area),
        )
        .route("/admin/data-feeds/connection-test", get(admin::feed_connection_test))
        .route("/admin/audit/companies", get(admin::audit_companies));

    let api = match cors_layer(&state.config.server.cors_origins) {
        Some(cors) => api.layer(cors),
        None => api,
    };

    api.layer(TraceLayer::new_for_http()).with_state(state)
}

/// CORS for the configured origins; `*` allows any, none disables CORS.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return Some(cors.allow_origin(Any));
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    Some(cors.allow_origin(origins))
}

/// Open the configured database and serve until interrupted.
///
/// # Errors
///
/// Returns an error if the bind address is invalid, the database cannot be
/// opened, or the listener fails.
pub async fn serve(config: Config) -> Result<()> {
    let addr = config.bind_address()?;
    let storage = Storage::open(config.database_path())?;
    let app = router(AppState::new(config, storage)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting HTTP server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if matches!(self, Self::Forbidden(_)) {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// 404 for an unknown detail slug, pointing back at the list page.
fn not_found(message: &str, redirect: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": message, "redirect": redirect })),
    )
        .into_response()
}

/// 302 to `location`, setting each of `cookies`.
fn redirect(location: &str, cookies: &[String]) -> Result<Response> {
    let mut headers = HeaderMap::new();
    headers.insert(
        LOCATION,
        HeaderValue::from_str(location)
            .map_err(|e| Error::internal(format!("invalid redirect location: {e}")))?,
    );
    for cookie in cookies {
        headers.append(
            SET_COOKIE,
            HeaderValue::from_str(cookie)
                .map_err(|e| Error::internal(format!("invalid cookie: {e}")))?,
        );
    }
    Ok((StatusCode::FOUND, headers).into_response())
}

/// Cookies sent with a request.
fn request_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| parse_cookies(v).into_iter())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Environment;
    use crate::dataset::Dataset;

    pub(crate) fn state_with(config: Config) -> AppState {
        let storage = Storage::open_in_memory().unwrap();
        storage.import(&Dataset::demo()).unwrap();
        AppState::new(config, storage).unwrap()
    }

    pub(crate) fn state() -> AppState {
        state_with(Config::default())
    }

    pub(crate) async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    pub(crate) async fn get_json(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, _, body) = send(state, request).await;
        (status, body)
    }

    pub(crate) fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_error_status_codes() {
        let status = |e: Error| e.into_response().status();
        assert_eq!(status(Error::UnknownFlag("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(Error::SourceNotRegistered {
                kind: "database".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(Error::Forbidden("no".into())), StatusCode::FORBIDDEN);
        assert_eq!(status(Error::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_cors_layer_selection() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["*".to_string()]).is_some());
        assert!(cors_layer(&["https://toppharma.example".to_string()]).is_some());
    }

    #[test]
    fn test_request_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("ff_usedbcompanies=true; theme=dark"),
        );
        let cookies = request_cookies(&headers);
        assert_eq!(cookies["ff_usedbcompanies"], "true");
        assert_eq!(cookies["theme"], "dark");
    }

    #[test]
    fn test_state_activates_configured_source() {
        let mut config = Config::default();
        config.sources.default = "database".into();
        config.server.environment = Environment::Production;
        let state = state_with(config);
        assert_eq!(state.sources.active_kind().as_str(), "database");
        assert_eq!(state.sources.kinds().len(), 2);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(&state(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = get_json(&state(), "/api/nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_redirect_sets_cookies() {
        let response = redirect("/companies?x=1", &["a=1".into(), "b=2".into()]).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/companies?x=1");
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }
}
