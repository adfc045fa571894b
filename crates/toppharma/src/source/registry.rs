//! Registry of data sources and the active selection.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use super::{DataSource, SourceKind};
use crate::error::{Error, Result};

/// Registered data sources keyed by kind, plus which one is active.
#[derive(Debug)]
pub struct SourceRegistry {
    sources: RwLock<BTreeMap<SourceKind, Arc<dyn DataSource>>>,
    active: RwLock<SourceKind>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new(SourceKind::Mock)
    }
}

impl SourceRegistry {
    /// An empty registry whose active kind is `active`.
    ///
    /// The active kind only resolves once a source of that kind is
    /// registered.
    #[must_use]
    pub fn new(active: SourceKind) -> Self {
        Self {
            sources: RwLock::new(BTreeMap::new()),
            active: RwLock::new(active),
        }
    }

    /// Register a source, replacing any earlier one of the same kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register(&self, source: Arc<dyn DataSource>) -> Result<()> {
        let kind = source.kind();
        let mut sources = self
            .sources
            .write()
            .map_err(|_| Error::internal("source registry lock poisoned"))?;
        sources.insert(kind, source);
        Ok(())
    }

    /// Whether a source of `kind` is registered.
    #[must_use]
    pub fn has(&self, kind: SourceKind) -> bool {
        self.sources
            .read()
            .map(|s| s.contains_key(&kind))
            .unwrap_or(false)
    }

    /// The source of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotRegistered`] if no such source exists.
    pub fn get(&self, kind: SourceKind) -> Result<Arc<dyn DataSource>> {
        let sources = self
            .sources
            .read()
            .map_err(|_| Error::internal("source registry lock poisoned"))?;
        sources
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::SourceNotRegistered {
                kind: kind.to_string(),
            })
    }

    /// The active source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotRegistered`] if the active kind has no
    /// registered source.
    pub fn active(&self) -> Result<Arc<dyn DataSource>> {
        self.get(self.active_kind())
    }

    /// The active kind.
    #[must_use]
    pub fn active_kind(&self) -> SourceKind {
        self.active.read().map_or(SourceKind::Mock, |k| *k)
    }

    /// Make `kind` the active source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotRegistered`] if no source of `kind` is
    /// registered; the active source is left unchanged.
    pub fn set_active(&self, kind: SourceKind) -> Result<()> {
        if !self.has(kind) {
            return Err(Error::SourceNotRegistered {
                kind: kind.to_string(),
            });
        }
        let mut active = self
            .active
            .write()
            .map_err(|_| Error::internal("source registry lock poisoned"))?;
        if *active != kind {
            info!(from = %*active, to = %kind, "Switching active data source");
        }
        *active = kind;
        Ok(())
    }

    /// Registered kinds, in display order.
    #[must_use]
    pub fn kinds(&self) -> Vec<SourceKind> {
        self.sources
            .read()
            .map(|s| s.keys().copied().collect())
            .unwrap_or_default()
    }
}
