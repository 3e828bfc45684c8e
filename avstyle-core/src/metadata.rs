// ============================================================================
// avstyle-core/src/metadata.rs
// ============================================================================
//
// METADATA: Per-style source/output metadata records
//
// KEY COMPONENTS:
// - SourceMetadata: what the probe reported before transcoding
// - MeasuredDimensions / OutputMetadata: what the transcoded file measures,
//   after rotation reconciliation
// - MetadataRecord: the {source, output} pair stored for one style
// - MetadataDocument: the style -> record mapping persisted per attachment
//
// Sibling styles in a document are kept as raw JSON values so that merging
// one style never rewrites the others.

use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Probe result for a source file.
///
/// Everything but `streams` is optional; containers report wildly different
/// subsets of these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Clockwise rotation in degrees, normalized to 0..360.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u32>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u64>,
    /// Number of streams the container exposes.
    pub streams: usize,
}

impl SourceMetadata {
    /// A probe that found no streams counts as no probe at all.
    pub fn is_empty(&self) -> bool {
        self.streams == 0
    }
}

/// Raw dimensions and rotation of a transcoded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasuredDimensions {
    pub width: u32,
    pub height: u32,
    pub rotation: Option<u32>,
}

/// Output dimensions after portrait/landscape correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub width: u32,
    pub height: u32,
}

impl From<MeasuredDimensions> for OutputMetadata {
    fn from(measured: MeasuredDimensions) -> Self {
        let (width, height) = reconcile_rotation(measured.width, measured.height, measured.rotation);
        Self { width, height }
    }
}

/// Swaps width and height when the stream is rotated a quarter turn.
pub fn reconcile_rotation(width: u32, height: u32, rotation: Option<u32>) -> (u32, u32) {
    match rotation.map(|r| r % 360) {
        Some(90) | Some(270) => (height, width),
        _ => (width, height),
    }
}

/// Metadata stored for one (attachment, style) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub source: SourceMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputMetadata>,
}

impl MetadataRecord {
    pub fn new(source: SourceMetadata) -> Self {
        Self { source, output: None }
    }

    pub fn with_output(mut self, measured: MeasuredDimensions) -> Self {
        self.output = Some(measured.into());
        self
    }
}

/// Style name -> record mapping for one attachment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataDocument {
    styles: Map<String, Value>,
}

impl MetadataDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a stored document. A missing or blank value is an empty document.
    pub fn parse(serialized: Option<&str>) -> CoreResult<Self> {
        match serialized.map(str::trim) {
            None | Some("") => Ok(Self::new()),
            Some(text) => Ok(Self {
                styles: serde_json::from_str(text)?,
            }),
        }
    }

    /// Inserts or overwrites the record for `style`.
    pub fn insert(&mut self, style: &str, record: &MetadataRecord) -> CoreResult<()> {
        self.styles
            .insert(style.to_string(), serde_json::to_value(record)?);
        Ok(())
    }

    /// Decodes the record for `style`, if present.
    pub fn get(&self, style: &str) -> CoreResult<Option<MetadataRecord>> {
        self.styles
            .get(style)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(Into::into)
    }

    pub fn contains(&self, style: &str) -> bool {
        self.styles.contains_key(style)
    }

    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.styles.clone())
    }

    pub fn to_json_string(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(&self.styles)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> SourceMetadata {
        SourceMetadata {
            width: Some(1920),
            height: Some(1080),
            rotation: Some(90),
            duration: Some(12.5),
            video_codec: Some("h264".to_string()),
            audio_codec: Some("aac".to_string()),
            format_name: Some("mov,mp4,m4a,3gp,3g2,mj2".to_string()),
            bit_rate: Some(4_000_000),
            streams: 2,
        }
    }

    #[test]
    fn test_quarter_turns_swap_dimensions() {
        assert_eq!(reconcile_rotation(1920, 1080, Some(90)), (1080, 1920));
        assert_eq!(reconcile_rotation(1920, 1080, Some(270)), (1080, 1920));
        assert_eq!(reconcile_rotation(1920, 1080, Some(450)), (1080, 1920));
    }

    #[test]
    fn test_half_turn_and_absent_keep_dimensions() {
        assert_eq!(reconcile_rotation(1920, 1080, Some(0)), (1920, 1080));
        assert_eq!(reconcile_rotation(1920, 1080, Some(180)), (1920, 1080));
        assert_eq!(reconcile_rotation(1920, 1080, None), (1920, 1080));
    }

    #[test]
    fn test_record_serializes_source_and_output() {
        let record = MetadataRecord::new(source()).with_output(MeasuredDimensions {
            width: 320,
            height: 240,
            rotation: Some(270),
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["output"], json!({"width": 240, "height": 320}));
        assert_eq!(value["source"]["video_codec"], json!("h264"));
        assert_eq!(value["source"]["streams"], json!(2));
    }

    #[test]
    fn test_record_without_output_omits_key() {
        let value = serde_json::to_value(MetadataRecord::new(source())).unwrap();
        assert!(value.get("output").is_none());
    }

    #[test]
    fn test_parse_missing_or_blank_document() {
        assert!(MetadataDocument::parse(None).unwrap().is_empty());
        assert!(MetadataDocument::parse(Some("  ")).unwrap().is_empty());
        assert!(MetadataDocument::parse(Some("[1, 2]")).is_err());
    }

    #[test]
    fn test_insert_overwrites_and_keeps_siblings() {
        let stored = r#"{"original":{"source":{"streams":1},"custom":"kept"}}"#;
        let mut doc = MetadataDocument::parse(Some(stored)).unwrap();

        let record = MetadataRecord::new(source());
        doc.insert("thumb", &record).unwrap();
        doc.insert("thumb", &record.clone().with_output(MeasuredDimensions {
            width: 10,
            height: 20,
            rotation: None,
        }))
        .unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc.get("thumb").unwrap().unwrap().output,
            Some(OutputMetadata { width: 10, height: 20 })
        );
        assert_eq!(doc.as_value()["original"]["custom"], json!("kept"));

        let reparsed = MetadataDocument::parse(Some(&doc.to_json_string().unwrap())).unwrap();
        assert_eq!(reparsed, doc);
    }
}
