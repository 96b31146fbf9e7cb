//! # scraper-registry
//!
//! Local registry for remotely published scraping modules. Each module is
//! described by a metadata document (source name, script URL, version) served
//! over HTTP; the registry downloads the referenced script, caches it in a
//! storage directory and keeps it current by comparing remote versions.
//!
//! - [`registry`]: the locked catalog and its add/delete/list/content/refresh
//!   operations
//! - [`store`]: `modules.json` persistence
//! - [`fetcher`]: the HTTP seam for metadata and script downloads
//! - [`module`]: record and metadata types
//! - [`config`]: runtime configuration for front-ends

pub mod config;
pub mod error;
pub mod fetcher;
pub mod module;
pub mod registry;
pub mod store;

// Re-exports
pub use error::*;
pub use fetcher::{HttpFetcher, ModuleFetcher};
pub use module::{ModuleMetadata, ModuleRecord, ModuleSummary};
pub use registry::{RefreshEntry, RefreshOutcome, RefreshReport, Registry};
