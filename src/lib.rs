pub mod catalog;
pub mod config;
pub mod date;
pub mod error;
pub mod media;
pub mod sync;

pub use catalog::{Catalog, ImmichClient};
pub use config::CatalogConfig;
pub use date::{extract_date, Timestamp};
pub use error::{CatalogError, ConfigError, ExtractError};
pub use media::Asset;
pub use sync::{sync_day, SyncOptions, SyncReport};
