//! Catalog configuration.
//!
//! `CatalogConfig` carries everything a session needs before the first
//! fetch: the site base URL, the storage directory, the active
//! normalization rule id, exclude patterns and seed URLs. The type-safe
//! builder validates at `build()` time, so a malformed exclude pattern or
//! an unparseable base URL fails the whole operation up front.

mod builder;
mod types;

pub use builder::{CatalogConfigBuilder, WithBaseUrl, WithStorageDir};
pub use types::CatalogConfig;
