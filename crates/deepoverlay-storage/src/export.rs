//! Backup export and import documents.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use deepoverlay_core::constants::EXPORT_FILE_PREFIX;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::Mapping;
use crate::error::{StorageError, StorageResult};

/// A verbatim snapshot of the annotation mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub data: Mapping,
}

impl ExportDocument {
    pub fn new(exported_at: DateTime<Utc>, data: Mapping) -> Self {
        Self { exported_at, data }
    }

    /// `deep_overlay_backup_YYYY-MM-DD.json` for the export date.
    pub fn file_name(&self) -> String {
        export_file_name(self.exported_at.date_naive())
    }

    /// Writes the document pretty-printed into `dir`, returning the file path.
    pub fn write_to_dir(&self, dir: &Path) -> StorageResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        tracing::info!("Exported {} pages to {}", self.data.len(), path.display());
        Ok(path)
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}{}.json", EXPORT_FILE_PREFIX, date.format("%Y-%m-%d"))
}

/// Parses a backup file's content into the mapping to import.
///
/// Accepts both an [`ExportDocument`] and a bare `URL -> [record]` mapping,
/// the format older dashboards exported.
pub fn parse_backup(content: &str) -> StorageResult<Mapping> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Object(mut top) = value else {
        return Err(StorageError::Corrupted(
            "backup must be a JSON object".to_string(),
        ));
    };

    let is_document = top.len() == 2
        && top.get("exported_at").is_some_and(Value::is_string)
        && top.get("data").is_some_and(Value::is_object);

    if is_document {
        if let Some(Value::Object(data)) = top.remove("data") {
            return Ok(data);
        }
    }

    if let Some((key, _)) = top.iter().find(|(_, v)| !v.is_array()) {
        return Err(StorageError::Corrupted(format!(
            "backup entry '{}' is not a list of boxes",
            key
        )));
    }
    Ok(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "deep_overlay_backup_2024-03-07.json");
    }

    #[test]
    fn test_document_wire_format() {
        let mut data = Mapping::new();
        data.insert("https://x/a".to_string(), json!([]));
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 12, 30, 0).unwrap();
        let doc = ExportDocument::new(at, data);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["exported_at"], "2024-03-07T12:30:00Z");
        assert_eq!(value["data"]["https://x/a"], json!([]));
        assert_eq!(doc.file_name(), "deep_overlay_backup_2024-03-07.json");
    }

    #[test]
    fn test_parse_backup_both_formats() {
        let wrapped = r#"{"exported_at":"2024-03-07T12:30:00Z","data":{"https://x/a":[{"note":"n"}]}}"#;
        let mapping = parse_backup(wrapped).unwrap();
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("https://x/a"));

        let bare = r#"{"https://x/a":[],"https://x/b":[]}"#;
        assert_eq!(parse_backup(bare).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_backup_rejects_bad_shapes() {
        assert!(matches!(parse_backup("[1,2]"), Err(StorageError::Corrupted(_))));
        assert!(matches!(
            parse_backup(r#"{"https://x/a": 3}"#),
            Err(StorageError::Corrupted(_))
        ));
        assert!(matches!(parse_backup("not json"), Err(StorageError::JsonError(_))));
    }
}
