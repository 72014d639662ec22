//! Shared constants.

/// Smallest width/height (pixels) a freshly drawn box may have. Anything
/// smaller at pointer-up is treated as an accidental click.
pub const MIN_BOX_SIZE: f64 = 20.0;

/// Lower bound (pixels) applied to each dimension while resizing.
pub const MIN_RESIZE: f64 = 20.0;

/// How often hosts without push-based navigation events poll the page URL.
pub const URL_POLL_INTERVAL_MS: u64 = 1000;

/// Vertical gap between a selected box and its note editor.
pub const NOTE_EDITOR_OFFSET: f64 = 10.0;

/// File name prefix for backup exports.
pub const EXPORT_FILE_PREFIX: &str = "deep_overlay_backup_";
