use futures::future::try_join_all;
use placard_core::{FieldRule, FormLayout, UtilityMap};

use crate::crop::StagedRegions;
use crate::recognizer::{OcrError, TextDetector};

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// OCR every staged crop and clean up each field's text.
    ///
    /// The lookups run concurrently; the map is filled in layout order. A crop
    /// with no annotations gets an empty value and no `original_translation`
    /// entry.
    pub async fn extract<D>(
        detector: &D,
        layout: &FormLayout,
        staged: &StagedRegions,
    ) -> Result<UtilityMap, OcrError>
    where
        D: TextDetector + ?Sized,
    {
        let lookups = staged.names.iter().map(|name| {
            let object = staged.object(name);
            async move {
                let found = detector.detect_text(&object).await?;
                Ok::<_, OcrError>((name, found))
            }
        });
        let responses = try_join_all(lookups).await?;

        let mut map = UtilityMap::default();
        for (name, annotations) in responses {
            let value = match annotations.first() {
                Some(first) => {
                    map.original_translation
                        .insert(name.clone(), first.description.clone());
                    Self::normalize(layout.rule(name), &first.description)
                }
                None => String::new(),
            };
            tracing::debug!("{name} text value: {value:?}");
            map.fields.insert(name.clone(), value);
        }
        Ok(map)
    }

    /// Apply one field rule to raw OCR text. Never fails; text the rule
    /// cannot use comes back empty or as a partial token.
    pub fn normalize(rule: &FieldRule, raw: &str) -> String {
        match rule {
            FieldRule::Verbatim => raw.to_string(),
            FieldRule::Choice { strip, corrections, accept } => {
                let stripped: String = raw.chars().filter(|c| !strip.contains(*c)).collect();
                let corrected = corrections.get(&stripped).cloned().unwrap_or(stripped);
                if accept.contains(&corrected) {
                    corrected
                } else {
                    String::new()
                }
            }
            FieldRule::AfterDelimiter { delimiter } => {
                let text = flatten_lines(raw);
                match text.split(*delimiter).nth(1) {
                    Some(segment) => segment.trim().to_string(),
                    None => text,
                }
            }
            FieldRule::LastToken => {
                let text = flatten_lines(raw);
                text.rsplit(' ').next().unwrap_or_default().to_string()
            }
        }
    }
}

fn flatten_lines(text: &str) -> String {
    text.replace('\n', " ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
