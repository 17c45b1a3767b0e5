use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of an object in a bucket-addressed store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self { bucket: bucket.into(), name: name.into() }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.name)
    }
}

/// Key under which [`UtilityMap`] keeps the raw OCR text.
pub const ORIGINAL_TRANSLATION: &str = "original_translation";

/// Normalized field values plus the raw OCR text they came from.
///
/// Serializes as a flat object: one string per field in layout order, then an
/// `original_translation` object holding raw text for fields OCR saw.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UtilityMap {
    #[serde(flatten)]
    pub fields: IndexMap<String, String>,
    #[serde(default)]
    pub original_translation: IndexMap<String, String>,
}

impl UtilityMap {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// The message handed from extraction to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub utility_map: UtilityMap,
    pub filename: String,
}

impl ExtractionResult {
    /// Name of the persisted document: everything before the first `.`, plus `.json`.
    pub fn result_name(&self) -> String {
        let stem = self.filename.split('.').next().unwrap_or_default();
        format!("{stem}.json")
    }

    /// The persisted document: `utility_map` as JSON with a four-space indent.
    pub fn render_record(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.utility_map.serialize(&mut ser)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ExtractionResult {
        let mut map = UtilityMap::default();
        map.fields.insert("renew_size".into(), "1/2".into());
        map.fields.insert("house_number".into(), "".into());
        map.original_translation.insert("renew_size".into(), "162".into());
        ExtractionResult { utility_map: map, filename: "placard.jpg".into() }
    }

    #[test]
    fn utility_map_serializes_flat() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "utility_map": {
                    "renew_size": "1/2",
                    "house_number": "",
                    "original_translation": { "renew_size": "162" }
                },
                "filename": "placard.jpg"
            })
        );
    }

    #[test]
    fn utility_map_deserializes_from_flat_object() {
        let raw = r#"{"house_number": "45", "original_translation": {"house_number": "Main 45"}}"#;
        let map: UtilityMap = serde_json::from_str(raw).unwrap();
        assert_eq!(map.get("house_number"), Some("45"));
        assert_eq!(map.original_translation.get("house_number").unwrap(), "Main 45");
        assert!(!map.fields.contains_key("original_translation"));
    }

    #[test]
    fn result_name_replaces_extension() {
        assert_eq!(sample().result_name(), "placard.json");
        let r = ExtractionResult { filename: "site.2024.png".into(), ..sample() };
        assert_eq!(r.result_name(), "site.json");
        let r = ExtractionResult { filename: "noext".into(), ..sample() };
        assert_eq!(r.result_name(), "noext.json");
    }

    #[test]
    fn record_uses_four_space_indent() {
        let text = String::from_utf8(sample().render_record().unwrap()).unwrap();
        assert!(text.starts_with("{\n    \""));
        assert!(text.contains("\n        \"renew_size\": \"162\""));
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, serde_json::to_value(&sample().utility_map).unwrap());
    }

    #[test]
    fn record_keeps_field_insertion_order() {
        let mut map = UtilityMap::default();
        for key in ["renew_size", "nearest_crossed_street", "house_number", "renew_date"] {
            map.fields.insert(key.into(), String::new());
        }
        let result = ExtractionResult { utility_map: map, filename: "a.png".into() };
        let text = String::from_utf8(result.render_record().unwrap()).unwrap();

        let expected = "{\n    \"renew_size\": \"\",\n    \"nearest_crossed_street\": \"\",\n    \"house_number\": \"\",\n    \"renew_date\": \"\",\n    \"original_translation\": {}\n}";
        assert_eq!(text, expected);
    }

    #[test]
    fn decoding_keeps_document_order() {
        let raw = r#"{"renew_date": "1", "renew_size": "2", "original_translation": {"renew_size": "b", "renew_date": "a"}}"#;
        let map: UtilityMap = serde_json::from_str(raw).unwrap();
        assert_eq!(map.fields.keys().collect::<Vec<_>>(), vec!["renew_date", "renew_size"]);
        assert_eq!(map.original_translation.keys().collect::<Vec<_>>(), vec!["renew_size", "renew_date"]);
    }

    #[test]
    fn object_ref_display() {
        assert_eq!(ObjectRef::new("processed", "a.png").to_string(), "processed/a.png");
    }
}
