//! Per-page annotation persistence.
//!
//! The store writes and reads whole page sequences. It never fails loudly
//! toward the overlay: when the host context is gone or a write fails, the
//! call is logged and becomes a no-op, and malformed records load with
//! defaults. The host-tooling operations further down (`delete_page`,
//! `update_note`, `import`...) return [`StorageResult`] instead.

use chrono::{DateTime, Utc};
use deepoverlay_core::{decode_page, encode_page, AnnotationBox, PageUrl};
use serde_json::Value;

use crate::backend::{KeyValueStore, Mapping};
use crate::error::{StorageError, StorageResult};
use crate::export::ExportDocument;
use crate::summary::{summarize, PageSummary};

/// Box Store over a [`KeyValueStore`] backend.
#[derive(Debug, Clone, Default)]
pub struct PageStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> PageStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    pub fn is_alive(&self) -> bool {
        self.backend.is_alive()
    }

    /// Persists the full ordered sequence for `url`, replacing what was there.
    ///
    /// Returns `false` (after logging) when nothing was written.
    pub fn save_all(&mut self, url: &PageUrl, boxes: &[AnnotationBox]) -> bool {
        if !self.backend.is_alive() {
            tracing::warn!("Storage context invalidated, not saving {}", url);
            return false;
        }

        match self.backend.set(url.as_str(), encode_page(boxes)) {
            Ok(()) => {
                tracing::debug!("Saved {} boxes for {}", boxes.len(), url);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to save boxes for {}: {}", url, e);
                false
            }
        }
    }

    /// Loads the ordered sequence for `url`.
    ///
    /// Missing pages, an invalidated context and unreadable page values all
    /// load as empty. Boxes get ids `0..n` in stored order.
    pub fn load_all(&self, url: &PageUrl) -> Vec<AnnotationBox> {
        if !self.backend.is_alive() {
            tracing::warn!("Storage context invalidated, not loading {}", url);
            return Vec::new();
        }

        let value = match self.backend.get(url.as_str()) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to load boxes for {}: {}", url, e);
                return Vec::new();
            }
        };

        let entries = match decode_page(url.as_str(), &value, 0) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("{}", e);
                return Vec::new();
            }
        };

        let mut boxes = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match entry {
                Some(decoded) => {
                    if !decoded.is_clean() {
                        tracing::warn!(
                            "Record {} for {} had unreadable fields {:?}, using defaults",
                            index,
                            url,
                            decoded.defaulted
                        );
                    }
                    boxes.push(decoded.annotation);
                }
                None => tracing::warn!("Skipping non-object record {} for {}", index, url),
            }
        }

        tracing::info!("Loaded {} boxes for {}", boxes.len(), url);
        boxes
    }

    /// Removes every box stored for `url`.
    pub fn delete_page(&mut self, url: &str) -> StorageResult<()> {
        self.ensure_alive()?;
        self.backend.remove(url)?;
        tracing::info!("Deleted page {}", url);
        Ok(())
    }

    /// Removes every stored page.
    pub fn clear_all(&mut self) -> StorageResult<()> {
        self.ensure_alive()?;
        self.backend.replace_all(Mapping::new())?;
        tracing::info!("Cleared all stored pages");
        Ok(())
    }

    /// Rewrites the note of the `index`-th stored record of `url`, leaving
    /// every other field as stored.
    ///
    /// Returns `false` when the page or record does not exist.
    pub fn update_note(&mut self, url: &str, index: usize, text: &str) -> StorageResult<bool> {
        self.ensure_alive()?;

        let Some(mut page) = self.backend.get(url)? else {
            return Ok(false);
        };

        let Some(record) = page.as_array_mut().and_then(|records| records.get_mut(index)) else {
            return Ok(false);
        };

        let Some(fields) = record.as_object_mut() else {
            return Err(StorageError::Corrupted(format!(
                "record {} for {} is not an object",
                index, url
            )));
        };

        fields.insert("note".to_string(), Value::String(text.to_string()));
        self.backend.set(url, page)?;
        Ok(true)
    }

    /// Stored page keys, sorted.
    pub fn page_urls(&self) -> StorageResult<Vec<String>> {
        self.ensure_alive()?;
        let mut urls: Vec<String> = self.backend.get_all()?.keys().cloned().collect();
        urls.sort();
        Ok(urls)
    }

    /// Per-page summaries matching `query` (case-insensitive, against the URL
    /// and every note). An empty query matches everything.
    pub fn summaries(&self, query: &str) -> StorageResult<Vec<PageSummary>> {
        self.ensure_alive()?;
        Ok(summarize(&self.backend.get_all()?, query))
    }

    /// Size of the serialized mapping in bytes.
    pub fn usage_bytes(&self) -> StorageResult<usize> {
        self.ensure_alive()?;
        Ok(serde_json::to_vec(&self.backend.get_all()?)?.len())
    }

    /// Snapshot of the whole mapping, stamped with `now`.
    pub fn export(&self, now: DateTime<Utc>) -> StorageResult<ExportDocument> {
        self.ensure_alive()?;
        Ok(ExportDocument::new(now, self.backend.get_all()?))
    }

    /// Overwrites the whole collection with `mapping`.
    pub fn import(&mut self, mapping: Mapping) -> StorageResult<usize> {
        self.ensure_alive()?;
        let pages = mapping.len();
        self.backend.replace_all(mapping)?;
        tracing::info!("Imported {} pages", pages);
        Ok(pages)
    }

    fn ensure_alive(&self) -> StorageResult<()> {
        if self.backend.is_alive() {
            Ok(())
        } else {
            Err(StorageError::ContextInvalidated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use deepoverlay_core::{AnchorBinding, Locator, RatioBinding, Rect};
    use serde_json::json;

    fn url(href: &str) -> PageUrl {
        PageUrl::normalize(href)
    }

    fn sample_boxes() -> Vec<AnnotationBox> {
        vec![
            AnnotationBox::new(0, Rect::new(10.0, 10.0, 50.0, 50.0)).with_note("first"),
            AnnotationBox::new(1, Rect::new(150.0, 90.0, 400.0, 120.0))
                .with_note("second")
                .with_anchor(AnchorBinding {
                    locator: Locator::new("#main"),
                    ratios: RatioBinding::scaled(0.1, 0.1, 0.4, 0.3),
                }),
        ]
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let mut store = PageStore::new(MemoryStore::new());
        let page = url("https://x/a");
        assert!(store.save_all(&page, &sample_boxes()));

        let loaded = store.load_all(&page);
        assert_eq!(loaded, sample_boxes());
    }

    #[test]
    fn test_invalidated_context_is_noop() {
        let mut store = PageStore::new(MemoryStore::new());
        let page = url("https://x/a");
        store.save_all(&page, &sample_boxes());

        store.backend_mut().invalidate();
        assert!(!store.save_all(&page, &[]));
        assert!(store.load_all(&page).is_empty());
        assert!(matches!(
            store.delete_page(page.as_str()),
            Err(StorageError::ContextInvalidated)
        ));

        store.backend_mut().revive();
        assert_eq!(store.load_all(&page).len(), 2);
    }

    #[test]
    fn test_malformed_records_do_not_abort_page() {
        let mut mapping = Mapping::new();
        mapping.insert(
            "https://x/a".to_string(),
            json!([
                "garbage",
                { "l": "oops", "t": "5px", "w": "30px", "h": "30px", "note": "kept" },
                { "l": "1px", "t": "1px", "w": "20px", "h": "20px", "anchor": "#a", "rX": "0.5", "rY": "0.25", "rW": null, "rH": null }
            ]),
        );
        mapping.insert("https://x/b".to_string(), json!({ "not": "a list" }));
        let store = PageStore::new(MemoryStore::with_entries(mapping));

        let loaded = store.load_all(&url("https://x/a"));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].geometry.left, 0.0);
        assert_eq!(loaded[0].note, "kept");
        assert_eq!(
            loaded[1].anchor.as_ref().map(|a| a.ratios),
            Some(RatioBinding::offset(0.5, 0.25))
        );

        assert!(store.load_all(&url("https://x/b")).is_empty());
    }

    #[test]
    fn test_update_note_keeps_other_fields() {
        let mut store = PageStore::new(MemoryStore::new());
        let page = url("https://x/a");
        store.save_all(&page, &sample_boxes());

        assert!(store.update_note(page.as_str(), 1, "edited").unwrap());
        assert!(!store.update_note(page.as_str(), 5, "nope").unwrap());
        assert!(!store.update_note("https://x/missing", 0, "nope").unwrap());

        let loaded = store.load_all(&page);
        assert_eq!(loaded[1].note, "edited");
        assert_eq!(loaded[1].anchor, sample_boxes()[1].anchor);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut store = PageStore::new(MemoryStore::new());
        store.save_all(&url("https://x/a"), &sample_boxes());
        store.save_all(&url("https://x/b"), &sample_boxes());

        store.delete_page("https://x/a").unwrap();
        assert_eq!(store.page_urls().unwrap(), vec!["https://x/b".to_string()]);

        store.clear_all().unwrap();
        assert!(store.page_urls().unwrap().is_empty());
    }

    #[test]
    fn test_import_overwrites() {
        let mut store = PageStore::new(MemoryStore::new());
        store.save_all(&url("https://x/a"), &sample_boxes());

        let mut mapping = Mapping::new();
        mapping.insert("https://y/c".to_string(), json!([]));
        assert_eq!(store.import(mapping).unwrap(), 1);
        assert_eq!(store.page_urls().unwrap(), vec!["https://y/c".to_string()]);
    }

    #[test]
    fn test_usage_bytes_grows_with_data() {
        let mut store = PageStore::new(MemoryStore::new());
        let empty = store.usage_bytes().unwrap();
        store.save_all(&url("https://x/a"), &sample_boxes());
        assert!(store.usage_bytes().unwrap() > empty);
    }
}
