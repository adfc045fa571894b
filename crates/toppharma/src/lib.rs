//! `toppharma` - A directory of pharmaceutical companies, their products,
//! websites and therapeutic areas
//!
//! This library provides the storage, query building, data sources and
//! page logic behind the directory, and the HTTP API that serves it.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod logging;
pub mod model;
pub mod query;
pub mod server;
pub mod source;
pub mod storage;
pub mod text;

pub use config::Config;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use flags::{FeatureFlags, Flag};
pub use logging::init_logging;
pub use model::{Company, Product, ProductStage, TherapeuticArea, Website};
pub use query::{Page, PageInfo, QueryOptions};
pub use server::{router, serve, AppState};
pub use source::{DataSource, SourceKind, SourceRegistry};
pub use storage::{Storage, StorageStats};
