//! DeepOverlay Storage Crate
//!
//! Persists annotation boxes keyed by normalized page URL, and handles
//! backups and configuration.

pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod page_store;
pub mod summary;

pub use backend::{default_store_path, JsonFileStore, KeyValueStore, Mapping, MemoryStore};
pub use config::{
    default_config_path, EditorSettings, InteractionSettings, NavigationSettings, OverlayConfig,
    SessionSettings, StorageSettings,
};
pub use error::{ConfigError, ConfigResult, StorageError, StorageResult};
pub use export::{export_file_name, parse_backup, ExportDocument};
pub use page_store::PageStore;
pub use summary::{format_bytes, group_by_site, summarize, PageSummary};
