//! Read-only views over the stored mapping for host tooling: per-page
//! summaries, text search and grouping by site.

use std::collections::BTreeMap;

use deepoverlay_core::PageUrl;
use serde_json::Value;

use crate::backend::Mapping;

/// Site name used for keys that are not absolute URLs.
pub const UNKNOWN_SITE: &str = "Unknown";

/// One stored page as listed by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub url: String,
    pub site: String,
    pub box_count: usize,
    pub notes: Vec<String>,
}

/// Builds the summaries of every page matching `query`, sorted by URL.
///
/// A page matches when the lowercase query is a substring of its URL or of
/// any of its notes.
pub fn summarize(mapping: &Mapping, query: &str) -> Vec<PageSummary> {
    let query = query.to_lowercase();

    let mut summaries: Vec<PageSummary> = mapping
        .iter()
        .map(|(url, page)| {
            let records = page.as_array().map(Vec::as_slice).unwrap_or_default();
            let notes = records
                .iter()
                .map(|r| r.get("note").and_then(Value::as_str).unwrap_or_default().to_string())
                .collect();

            PageSummary {
                url: url.clone(),
                site: site_of(url),
                box_count: records.len(),
                notes,
            }
        })
        .filter(|s| {
            query.is_empty()
                || s.url.to_lowercase().contains(&query)
                || s.notes.iter().any(|n| n.to_lowercase().contains(&query))
        })
        .collect();

    summaries.sort_by(|a, b| a.url.cmp(&b.url));
    summaries
}

/// Groups summaries by site, sites sorted by name.
pub fn group_by_site(summaries: Vec<PageSummary>) -> BTreeMap<String, Vec<PageSummary>> {
    let mut groups: BTreeMap<String, Vec<PageSummary>> = BTreeMap::new();
    for summary in summaries {
        groups.entry(summary.site.clone()).or_default().push(summary);
    }
    groups
}

fn site_of(url: &str) -> String {
    PageUrl::normalize(url)
        .host()
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_SITE.to_string())
}

/// Human-readable byte count: `B` under 1 KiB, `KB` with one decimal under
/// 1 MiB, `MB` with two decimals above.
pub fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{} B", bytes)
    } else if b < KIB * KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{:.2} MB", b / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping() -> Mapping {
        let mut m = Mapping::new();
        m.insert(
            "https://docs.rs/serde".to_string(),
            json!([{ "note": "Derive Macros" }, { "note": "" }]),
        );
        m.insert("https://docs.rs/tokio".to_string(), json!([{ "note": "runtime" }]));
        m.insert("about:blank".to_string(), json!([]));
        m
    }

    #[test]
    fn test_summaries_sorted_with_sites() {
        let all = summarize(&mapping(), "");
        let urls: Vec<&str> = all.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["about:blank", "https://docs.rs/serde", "https://docs.rs/tokio"]);
        assert_eq!(all[0].site, UNKNOWN_SITE);
        assert_eq!(all[1].site, "docs.rs");
        assert_eq!(all[1].box_count, 2);
    }

    #[test]
    fn test_search_matches_url_or_note_case_insensitively() {
        let hits = summarize(&mapping(), "derive");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://docs.rs/serde");

        let hits = summarize(&mapping(), "TOKIO");
        assert_eq!(hits.len(), 1);

        assert!(summarize(&mapping(), "nothing here").is_empty());
    }

    #[test]
    fn test_group_by_site() {
        let groups = group_by_site(summarize(&mapping(), ""));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["docs.rs"].len(), 2);
        assert_eq!(groups[UNKNOWN_SITE].len(), 1);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
