use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::record::ORIGINAL_TRANSLATION;

pub const RENEW_SIZE: &str = "renew_size";
pub const NEAREST_CROSSED_STREET: &str = "nearest_crossed_street";
pub const HOUSE_NUMBER: &str = "house_number";
pub const RENEW_DATE: &str = "renew_date";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Failed to read layout file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse layout TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Region '{0}' is declared more than once")]
    DuplicateRegion(String),
    #[error("Rule '{0}' does not match any region")]
    UnknownRule(String),
    #[error("Layout declares no regions")]
    Empty,
    #[error("Region name '{0}' is reserved")]
    ReservedName(String),
}

/// A named rectangle in canonical-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionSpec {
    pub fn new(name: &str, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { name: name.to_string(), x, y, width, height }
    }
}

/// How raw OCR text for one field is turned into its final value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRule {
    /// Raw text is kept as-is.
    #[default]
    Verbatim,
    /// Remove every character in `strip`, apply literal `corrections`, then keep
    /// the value only if it is one of `accept`.
    Choice {
        #[serde(default)]
        strip: String,
        #[serde(default)]
        corrections: BTreeMap<String, String>,
        accept: Vec<String>,
    },
    /// Newlines become spaces; when `delimiter` occurs, keep the second segment.
    AfterDelimiter { delimiter: char },
    /// Newlines become spaces; keep the last space-delimited token.
    LastToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Everything that describes one physical form: canonical geometry, crop table
/// and per-field cleanup rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormLayout {
    pub canonical: Dimensions,
    /// Expected `width / height`, compared after rounding to three places.
    pub aspect_ratio: Decimal,
    pub regions: Vec<RegionSpec>,
    #[serde(default)]
    pub rules: BTreeMap<String, FieldRule>,
}

impl FormLayout {
    /// The utility permit placard.
    pub fn placard() -> Self {
        let regions = vec![
            RegionSpec::new(RENEW_SIZE, 171, 405, 111, 57),
            RegionSpec::new(NEAREST_CROSSED_STREET, 355, 125, 351, 52),
            RegionSpec::new(HOUSE_NUMBER, 1050, 200, 200, 125),
            RegionSpec::new(RENEW_DATE, 111, 504, 225, 43),
        ];

        let mut rules = BTreeMap::new();
        rules.insert(
            RENEW_SIZE.to_string(),
            FieldRule::Choice {
                strip: "\"".to_string(),
                corrections: BTreeMap::from([
                    ("162".to_string(), "1/2".to_string()),
                    ("364".to_string(), "3/4".to_string()),
                ]),
                accept: vec!["1/2".to_string(), "3/4".to_string(), "1".to_string()],
            },
        );
        rules.insert(
            NEAREST_CROSSED_STREET.to_string(),
            FieldRule::AfterDelimiter { delimiter: '.' },
        );
        rules.insert(HOUSE_NUMBER.to_string(), FieldRule::LastToken);
        rules.insert(RENEW_DATE.to_string(), FieldRule::LastToken);

        Self {
            canonical: Dimensions { width: 1584, height: 1224 },
            aspect_ratio: Decimal::new(1294, 3),
            regions,
            rules,
        }
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, LayoutError> {
        let layout: FormLayout = toml::from_str(toml_content)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.regions.is_empty() {
            return Err(LayoutError::Empty);
        }
        for (i, region) in self.regions.iter().enumerate() {
            if region.name == ORIGINAL_TRANSLATION {
                return Err(LayoutError::ReservedName(region.name.clone()));
            }
            if self.regions[..i].iter().any(|r| r.name == region.name) {
                return Err(LayoutError::DuplicateRegion(region.name.clone()));
            }
        }
        if let Some(name) = self.rules.keys().find(|k| self.region(k).is_none()) {
            return Err(LayoutError::UnknownRule(name.clone()));
        }
        Ok(())
    }

    pub fn region(&self, name: &str) -> Option<&RegionSpec> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Rule for a field; fields without an explicit rule are kept verbatim.
    pub fn rule(&self, name: &str) -> &FieldRule {
        static VERBATIM: FieldRule = FieldRule::Verbatim;
        self.rules.get(name).unwrap_or(&VERBATIM)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }
}

impl Default for FormLayout {
    fn default() -> Self {
        Self::placard()
    }
}
