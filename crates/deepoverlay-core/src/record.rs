//! Persisted record format for annotation boxes.
//!
//! Each page is stored as an ordered array of records:
//!
//! ```text
//! { "l": "150px", "t": "90px", "w": "400px", "h": "120px",
//!   "note": "...", "anchor": "#main > div:nth-of-type(2)" | null,
//!   "rX": "0.1", "rY": "0.1", "rW": "0.4" | null, "rH": "0.3" | null }
//! ```
//!
//! Pixel values carry a `px` suffix and ratios are numeric strings. Records
//! written by older versions have no anchor fields at all; those load as
//! floating boxes. Decoding is lenient: a record with missing or garbled
//! fields still yields a box (zero geometry, no anchor) so one bad entry never
//! prevents the rest of the page from loading.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotation::{AnchorBinding, AnnotationBox, BoxId, Locator, RatioBinding};
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Wire representation of one annotation box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBox {
    pub l: String,
    pub t: String,
    pub w: String,
    pub h: String,
    pub note: String,
    pub anchor: Option<String>,
    #[serde(rename = "rX")]
    pub r_x: String,
    #[serde(rename = "rY")]
    pub r_y: String,
    #[serde(rename = "rW")]
    pub r_w: Option<String>,
    #[serde(rename = "rH")]
    pub r_h: Option<String>,
}

impl StoredBox {
    /// Encodes a box. Floating boxes store zero offsets and null size ratios.
    pub fn from_box(annotation: &AnnotationBox) -> Self {
        let g = &annotation.geometry;
        let (anchor, ratios) = match &annotation.anchor {
            Some(binding) => (Some(binding.locator.to_string()), binding.ratios),
            None => (None, RatioBinding::offset(0.0, 0.0)),
        };

        Self {
            l: px(g.left),
            t: px(g.top),
            w: px(g.width),
            h: px(g.height),
            note: annotation.note.clone(),
            anchor,
            r_x: ratios.x.to_string(),
            r_y: ratios.y.to_string(),
            r_w: ratios.width.map(|v| v.to_string()),
            r_h: ratios.height.map(|v| v.to_string()),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "l": self.l,
            "t": self.t,
            "w": self.w,
            "h": self.h,
            "note": self.note,
            "anchor": self.anchor,
            "rX": self.r_x,
            "rY": self.r_y,
            "rW": self.r_w,
            "rH": self.r_h,
        })
    }
}

fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Result of leniently decoding one stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBox {
    pub annotation: AnnotationBox,
    /// Fields that were missing or unreadable and fell back to defaults.
    pub defaulted: Vec<&'static str>,
}

impl DecodedBox {
    pub fn is_clean(&self) -> bool {
        self.defaulted.is_empty()
    }
}

/// Decodes one stored record.
///
/// Returns `None` only when the value is not an object at all.
pub fn decode_box(id: BoxId, value: &Value) -> Option<DecodedBox> {
    let obj = value.as_object()?;
    let mut defaulted = Vec::new();

    let mut dimension = |key: &'static str| -> f64 {
        match obj.get(key).and_then(read_number) {
            Some(v) => v,
            None => {
                defaulted.push(key);
                0.0
            }
        }
    };

    let left = dimension("l");
    let top = dimension("t");
    let width = dimension("w").max(0.0);
    let height = dimension("h").max(0.0);

    let note = match obj.get("note") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(_) => {
            defaulted.push("note");
            String::new()
        }
    };

    let anchor = match obj.get("anchor") {
        Some(Value::String(raw)) if !raw.trim().is_empty() => {
            let x = obj.get("rX").and_then(read_number);
            let y = obj.get("rY").and_then(read_number);
            match (x, y) {
                (Some(x), Some(y)) => Some(AnchorBinding {
                    locator: Locator::new(raw.clone()),
                    ratios: RatioBinding {
                        x,
                        y,
                        width: optional_ratio(obj.get("rW"), "rW", &mut defaulted),
                        height: optional_ratio(obj.get("rH"), "rH", &mut defaulted),
                    },
                }),
                _ => {
                    if x.is_none() {
                        defaulted.push("rX");
                    }
                    if y.is_none() {
                        defaulted.push("rY");
                    }
                    None
                }
            }
        }
        Some(Value::String(_)) | Some(Value::Null) | None => None,
        Some(_) => {
            defaulted.push("anchor");
            None
        }
    };

    let annotation = AnnotationBox {
        id,
        geometry: Rect::new(left, top, width, height),
        note,
        anchor,
    };

    Some(DecodedBox {
        annotation,
        defaulted,
    })
}

fn optional_ratio(
    value: Option<&Value>,
    key: &'static str,
    defaulted: &mut Vec<&'static str>,
) -> Option<f64> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => {
            let parsed = read_number(v);
            if parsed.is_none() {
                defaulted.push(key);
            }
            parsed
        }
    }
}

/// Reads `"12px"`, `"12.5"` or a bare JSON number. Non-finite values are rejected.
fn read_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            let digits = trimmed.strip_suffix("px").unwrap_or(trimmed).trim_end();
            digits.parse::<f64>().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Encodes a whole page.
pub fn encode_page<'a>(boxes: impl IntoIterator<Item = &'a AnnotationBox>) -> Value {
    Value::Array(
        boxes
            .into_iter()
            .map(|b| StoredBox::from_box(b).to_value())
            .collect(),
    )
}

/// Decodes a whole page value into its record entries.
///
/// `first_id` is assigned to the first record, incrementing per record.
/// Entries that are not objects are skipped; the caller receives them as
/// `None` positions so it can report them.
pub fn decode_page(url: &str, value: &Value, first_id: BoxId) -> Result<Vec<Option<DecodedBox>>> {
    let entries = value.as_array().ok_or_else(|| Error::MalformedRecord {
        url: url.to_string(),
        reason: format!("expected an array of boxes, found {}", value_kind(value)),
    })?;

    Ok(entries
        .iter()
        .zip(first_id..)
        .map(|(entry, id)| decode_box(id, entry))
        .collect())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn anchored_box() -> AnnotationBox {
        AnnotationBox::new(7, Rect::new(150.0, 90.0, 400.0, 120.0))
            .with_note("check this")
            .with_anchor(AnchorBinding {
                locator: Locator::new("#main > div:nth-of-type(2)"),
                ratios: RatioBinding::scaled(0.1, 0.1, 0.4, 0.3),
            })
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let value = StoredBox::from_box(&anchored_box()).to_value();
        assert_eq!(value["l"], "150px");
        assert_eq!(value["t"], "90px");
        assert_eq!(value["w"], "400px");
        assert_eq!(value["h"], "120px");
        assert_eq!(value["note"], "check this");
        assert_eq!(value["anchor"], "#main > div:nth-of-type(2)");
        assert_eq!(value["rX"], "0.1");
        assert_eq!(value["rW"], "0.4");
        assert_eq!(value["rH"], "0.3");
    }

    #[test]
    fn test_encode_floating_box() {
        let b = AnnotationBox::new(1, Rect::new(12.5, 40.0, 30.0, 20.0));
        let value = StoredBox::from_box(&b).to_value();
        assert_eq!(value["l"], "12.5px");
        assert_eq!(value["anchor"], Value::Null);
        assert_eq!(value["rX"], "0");
        assert_eq!(value["rW"], Value::Null);
    }

    #[test]
    fn test_decode_restores_anchor_and_ratios() {
        let original = anchored_box();
        let value = StoredBox::from_box(&original).to_value();
        let decoded = decode_box(7, &value).unwrap();
        assert!(decoded.is_clean());
        assert_eq!(decoded.annotation, original);
    }

    #[test]
    fn test_decode_legacy_record_is_floating() {
        let value = json!({ "l": "10px", "t": "20px", "w": "100px", "h": "50px", "note": "old" });
        let decoded = decode_box(0, &value).unwrap();
        assert!(decoded.is_clean());
        assert!(decoded.annotation.anchor.is_none());
        assert_eq!(decoded.annotation.geometry, Rect::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(decoded.annotation.note, "old");
    }

    #[test]
    fn test_decode_missing_fields_defaults() {
        let value = json!({ "w": "100px", "anchor": "#x", "rY": "0.5" });
        let decoded = decode_box(0, &value).unwrap();
        assert_eq!(decoded.annotation.geometry, Rect::new(0.0, 0.0, 100.0, 0.0));
        assert!(decoded.annotation.anchor.is_none());
        assert!(decoded.defaulted.contains(&"l"));
        assert!(decoded.defaulted.contains(&"h"));
        assert!(decoded.defaulted.contains(&"rX"));
        assert!(!decoded.defaulted.contains(&"rY"));
    }

    #[test]
    fn test_decode_accepts_numbers_and_bare_strings() {
        let value = json!({ "l": 5, "t": "6", "w": " 7px ", "h": 8.5, "anchor": null });
        let decoded = decode_box(0, &value).unwrap();
        assert!(decoded.is_clean());
        assert_eq!(decoded.annotation.geometry, Rect::new(5.0, 6.0, 7.0, 8.5));
    }

    #[test]
    fn test_decode_rejects_garbled_size_ratio() {
        let value = json!({
            "l": "0px", "t": "0px", "w": "10px", "h": "10px",
            "anchor": "#a", "rX": "0.5", "rY": "0.5", "rW": "wide", "rH": "0.2"
        });
        let decoded = decode_box(0, &value).unwrap();
        let anchor = decoded.annotation.anchor.unwrap();
        assert_eq!(anchor.ratios.width, None);
        assert_eq!(anchor.ratios.height, Some(0.2));
        assert_eq!(decoded.defaulted, vec!["rW"]);
    }

    #[test]
    fn test_decode_non_object_is_none() {
        assert!(decode_box(0, &json!(42)).is_none());
        assert!(decode_box(0, &Value::Null).is_none());
    }

    #[test]
    fn test_decode_page_requires_array() {
        let err = decode_page("https://x/a", &json!({"l": "1px"}), 0).unwrap_err();
        assert!(err.to_string().contains("expected an array"));

        let page = json!([{ "l": "1px", "t": "2px", "w": "3px", "h": "4px" }, "junk"]);
        let decoded = decode_page("https://x/a", &page, 10).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].as_ref().map(|d| d.annotation.id), Some(10));
        assert!(decoded[1].is_none());
    }
}
