//! # DeepOverlay
//!
//! Anchored annotation overlays for web pages. Boxes and notes drawn over a
//! page are bound to the element underneath them and follow it through
//! resizes, reflows and reloads.
//!
//! ## Architecture
//!
//! DeepOverlay is organized as a workspace with multiple crates:
//!
//! 1. **deepoverlay-core** - Geometry, the box model, record format, URL keys, control protocol
//! 2. **deepoverlay-storage** - Key-value backends, per-page store, backups, configuration
//! 3. **deepoverlay-engine** - Locators, anchoring, reconciliation, gestures, overlay session
//! 4. **deepoverlay** - The `deepoverlay` command for inspecting and managing stored annotations

pub mod cli;

pub use deepoverlay_core::{
    AnchorBinding, AnnotationBox, BoxId, ControlMessage, ControlResponse, Error, Locator,
    PageUrl, Point, RatioBinding, Rect, Result, StatusReport,
};

pub use deepoverlay_storage::{
    default_config_path, default_store_path, format_bytes, group_by_site, parse_backup,
    ConfigError, ExportDocument, JsonFileStore, KeyValueStore, MemoryStore, OverlayConfig,
    PageStore, PageSummary, StorageError,
};

pub use deepoverlay_engine::{
    FrameRequest, GestureOutcome, KeyDisposition, KeyTarget, LayoutEvent, OverlaySession,
    OverlayView, PageDom, PageTree, PointerTarget, ReconcileReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Initialize logging
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// The level defaults to INFO and can be overridden with `RUST_LOG`.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}
