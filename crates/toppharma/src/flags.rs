//! Feature flags.
//!
//! Flags have a default (from configuration), an optional stored value set
//! through the admin API, and per-request overrides. A request resolves
//! each flag with this precedence, highest first:
//!
//! 1. a `ff_<name>` query parameter,
//! 2. a `ff_<name>` cookie,
//! 3. the stored value,
//! 4. the configured default.
//!
//! `<name>` is the lowercase flag name. Overrides count as `true` only when
//! their value is exactly `true`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Prefix of flag cookies and query parameters.
pub const FLAG_PREFIX: &str = "ff_";

/// Where flag toggles redirect when the caller gives no URL.
pub const DEFAULT_FLAG_REDIRECT: &str = "/admin/audit/feature-flags";

/// Lifetime of flag and data-source cookies.
pub const COOKIE_DAYS: i64 = 30;

/// Expiry used to clear a cookie.
const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// A known feature flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    /// Read companies from the database.
    UseDbCompanies,
    /// Read products from the database.
    UseDbProducts,
    /// Read websites from the database.
    UseDbWebsites,
    /// Read therapeutic areas from the database.
    UseDbTherapeuticAreas,
    /// Read company financials from the database.
    UseDbCompanyFinancials,
    /// Read company metrics from the database.
    UseDbCompanyMetrics,
    /// Read company stock data from the database.
    UseDbCompanyStockData,
    /// Prefer a local database over the hosted one.
    UseLocalDatabase,
    /// Show the data-source toggle in the admin section.
    EnableDataSourceToggle,
}

impl Flag {
    /// Every flag, in display order.
    pub const ALL: [Self; 9] = [
        Self::UseDbCompanies,
        Self::UseDbProducts,
        Self::UseDbWebsites,
        Self::UseDbTherapeuticAreas,
        Self::UseDbCompanyFinancials,
        Self::UseDbCompanyMetrics,
        Self::UseDbCompanyStockData,
        Self::UseLocalDatabase,
        Self::EnableDataSourceToggle,
    ];

    /// The flag's canonical camelCase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::UseDbCompanies => "useDbCompanies",
            Self::UseDbProducts => "useDbProducts",
            Self::UseDbWebsites => "useDbWebsites",
            Self::UseDbTherapeuticAreas => "useDbTherapeuticAreas",
            Self::UseDbCompanyFinancials => "useDbCompanyFinancials",
            Self::UseDbCompanyMetrics => "useDbCompanyMetrics",
            Self::UseDbCompanyStockData => "useDbCompanyStockData",
            Self::UseLocalDatabase => "useLocalDatabase",
            Self::EnableDataSourceToggle => "enableDataSourceToggle",
        }
    }

    /// Look a flag up by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Name of the cookie and query parameter carrying an override.
    #[must_use]
    pub fn param_name(self) -> String {
        format!("{FLAG_PREFIX}{}", self.name().to_lowercase())
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::UnknownFlag(s.to_string()))
    }
}

/// Flag values keyed by canonical name, as served by the API.
pub type FlagValues = BTreeMap<&'static str, bool>;

/// Flag defaults plus stored values set at runtime.
#[derive(Debug, Default)]
pub struct FeatureFlags {
    defaults: BTreeMap<Flag, bool>,
    stored: RwLock<BTreeMap<Flag, bool>>,
}

impl FeatureFlags {
    /// Build from configured defaults; unknown names are ignored and
    /// unconfigured flags default to `false`.
    #[must_use]
    pub fn new(configured: &BTreeMap<String, bool>) -> Self {
        let mut defaults = BTreeMap::new();
        for (name, value) in configured {
            match Flag::from_name(name) {
                Some(flag) => {
                    defaults.insert(flag, *value);
                }
                None => warn!("Ignoring unknown feature flag in configuration: {}", name),
            }
        }
        Self {
            defaults,
            stored: RwLock::new(BTreeMap::new()),
        }
    }

    /// The configured default of `flag`.
    #[must_use]
    pub fn default_value(&self, flag: Flag) -> bool {
        self.defaults.get(&flag).copied().unwrap_or(false)
    }

    /// The stored value of `flag`, falling back to its default.
    #[must_use]
    pub fn get(&self, flag: Flag) -> bool {
        self.stored
            .read()
            .ok()
            .and_then(|s| s.get(&flag).copied())
            .unwrap_or_else(|| self.default_value(flag))
    }

    /// Store a value for `flag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag store lock is poisoned.
    pub fn set(&self, flag: Flag, value: bool) -> Result<()> {
        let mut stored = self
            .stored
            .write()
            .map_err(|_| Error::internal("feature flag lock poisoned"))?;
        stored.insert(flag, value);
        debug!(flag = flag.name(), value, "Feature flag set");
        Ok(())
    }

    /// Drop every stored value so all flags return to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag store lock is poisoned.
    pub fn reset(&self) -> Result<()> {
        let mut stored = self
            .stored
            .write()
            .map_err(|_| Error::internal("feature flag lock poisoned"))?;
        stored.clear();
        debug!("Feature flags reset to defaults");
        Ok(())
    }

    /// Stored-or-default values of every flag.
    #[must_use]
    pub fn snapshot(&self) -> FlagValues {
        Flag::ALL.into_iter().map(|f| (f.name(), self.get(f))).collect()
    }

    /// Resolve every flag for one request.
    ///
    /// `query` holds the request's query parameters and `cookies` its
    /// parsed cookies.
    #[must_use]
    pub fn resolve(
        &self,
        query: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> FlagValues {
        Flag::ALL
            .into_iter()
            .map(|flag| {
                let param = flag.param_name();
                let value = query
                    .get(&param)
                    .or_else(|| cookies.get(&param))
                    .map_or_else(|| self.get(flag), |v| v == "true");
                (flag.name(), value)
            })
            .collect()
    }
}

/// Parse a `Cookie` header into name/value pairs.
#[must_use]
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Format a timestamp for a cookie `expires` attribute.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `Set-Cookie` value persisting a flag for [`COOKIE_DAYS`] days.
#[must_use]
pub fn flag_cookie(flag: Flag, value: bool, now: DateTime<Utc>) -> String {
    let expires = http_date(now + Duration::days(COOKIE_DAYS));
    format!(
        "{}={value}; path=/; expires={expires}; SameSite=Lax",
        flag.param_name()
    )
}

/// `Set-Cookie` value that clears a flag cookie.
#[must_use]
pub fn cleared_flag_cookie(flag: Flag) -> String {
    format!(
        "{}=false; path=/; expires={EPOCH_EXPIRES}; SameSite=Lax",
        flag.param_name()
    )
}

/// Split a URL into the part before the query, its query pairs and the
/// fragment (with its leading `#`).
fn split_url(url: &str) -> (&str, Vec<&str>, &str) {
    let (rest, fragment) = match url.find('#') {
        Some(i) => url.split_at(i),
        None => (url, ""),
    };
    let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
    let pairs = query.split('&').filter(|p| !p.is_empty()).collect();
    (base, pairs, fragment)
}

fn join_url(base: &str, pairs: &[String], fragment: &str) -> String {
    if pairs.is_empty() {
        format!("{base}{fragment}")
    } else {
        format!("{base}?{}{fragment}", pairs.join("&"))
    }
}

fn pair_name(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(name, _)| name)
}

/// Redirect target after toggling `flag`: any existing override parameter
/// for the flag is replaced by `ff_<name>=<value>`.
#[must_use]
pub fn with_flag_param(url: &str, flag: Flag, value: bool) -> String {
    let param = flag.param_name();
    let (base, pairs, fragment) = split_url(url);
    let mut kept: Vec<String> = pairs
        .into_iter()
        .filter(|p| pair_name(p) != param)
        .map(str::to_string)
        .collect();
    kept.push(format!("{param}={value}"));
    join_url(base, &kept, fragment)
}

/// Redirect target after a reset: every known flag override parameter is
/// removed.
#[must_use]
pub fn without_flag_params(url: &str) -> String {
    let params: Vec<String> = Flag::ALL.iter().map(|f| f.param_name()).collect();
    let (base, pairs, fragment) = split_url(url);
    let kept: Vec<String> = pairs
        .into_iter()
        .filter(|p| !params.iter().any(|name| name == pair_name(p)))
        .map(str::to_string)
        .collect();
    join_url(base, &kept, fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_flag_names() {
        assert_eq!(Flag::ALL.len(), 9);
        for flag in Flag::ALL {
            assert_eq!(Flag::from_name(flag.name()), Some(flag));
        }
        assert_eq!(Flag::UseDbCompanies.param_name(), "ff_usedbcompanies");
        assert!(Flag::from_name("usedbcompanies").is_none());
        assert!(matches!(
            "darkMode".parse::<Flag>(),
            Err(Error::UnknownFlag(_))
        ));
    }

    #[test]
    fn test_defaults_from_config() {
        let mut configured = BTreeMap::new();
        configured.insert("useDbProducts".to_string(), true);
        configured.insert("bogus".to_string(), true);
        let flags = FeatureFlags::new(&configured);

        assert!(flags.get(Flag::UseDbProducts));
        assert!(!flags.get(Flag::UseDbCompanies));
        assert_eq!(flags.snapshot().len(), 9);
    }

    #[test]
    fn test_set_and_reset() {
        let flags = FeatureFlags::default();
        flags.set(Flag::EnableDataSourceToggle, true).unwrap();
        assert!(flags.get(Flag::EnableDataSourceToggle));

        flags.reset().unwrap();
        assert!(!flags.get(Flag::EnableDataSourceToggle));
    }

    #[test]
    fn test_resolve_precedence() {
        let flags = FeatureFlags::default();
        flags.set(Flag::UseDbCompanies, true).unwrap();
        flags.set(Flag::UseDbProducts, true).unwrap();

        let query = map(&[("ff_usedbcompanies", "false"), ("ff_usedbwebsites", "true")]);
        let cookies = map(&[
            ("ff_usedbcompanies", "true"),
            ("ff_usedbproducts", "false"),
            ("ff_uselocaldatabase", "true"),
        ]);
        let resolved = flags.resolve(&query, &cookies);

        // query beats cookie and stored
        assert!(!resolved["useDbCompanies"]);
        // cookie beats stored
        assert!(!resolved["useDbProducts"]);
        assert!(resolved["useDbWebsites"]);
        assert!(resolved["useLocalDatabase"]);
        // default
        assert!(!resolved["enableDataSourceToggle"]);
    }

    #[test]
    fn test_override_requires_literal_true() {
        let flags = FeatureFlags::default();
        let resolved = flags.resolve(&map(&[("ff_usedbcompanies", "1")]), &HashMap::new());
        assert!(!resolved["useDbCompanies"]);
    }

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("ff_usedbcompanies=true; theme=dark;broken; =x");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["ff_usedbcompanies"], "true");
        assert_eq!(cookies["theme"], "dark");
    }

    #[test]
    fn test_flag_cookie() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            flag_cookie(Flag::UseDbProducts, true, now),
            "ff_usedbproducts=true; path=/; expires=Sun, 31 Mar 2024 12:00:00 GMT; SameSite=Lax"
        );
        assert_eq!(
            cleared_flag_cookie(Flag::UseDbProducts),
            "ff_usedbproducts=false; path=/; expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Lax"
        );
    }

    #[test]
    fn test_with_flag_param() {
        assert_eq!(
            with_flag_param("/admin/audit/feature-flags", Flag::UseDbCompanies, true),
            "/admin/audit/feature-flags?ff_usedbcompanies=true"
        );
        assert_eq!(
            with_flag_param(
                "/companies?page=2&ff_usedbcompanies=true#list",
                Flag::UseDbCompanies,
                false
            ),
            "/companies?page=2&ff_usedbcompanies=false#list"
        );
    }

    #[test]
    fn test_without_flag_params() {
        assert_eq!(
            without_flag_params("/products?ff_usedbproducts=true&sort=name_asc&ff_uselocaldatabase=false"),
            "/products?sort=name_asc"
        );
        assert_eq!(without_flag_params("/?ff_usedbwebsites=true"), "/");
    }
}
