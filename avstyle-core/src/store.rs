// ============================================================================
// avstyle-core/src/store.rs
// ============================================================================
//
// METADATA STORES: Where attachment metadata documents live
//
// KEY COMPONENTS:
// - MetadataStore: key -> serialized value storage for one attachment
// - MemoryMetadataStore: in-process map
// - JsonFileMetadataStore: one JSON file per attachment
// - Attachment: a store plus the field holding the style document
//
// Stores offer plain read / write. The transcoder performs a
// read-modify-write on each successful run, with no locking: two styles of
// the same attachment must not be transcoded concurrently.

use crate::config::DEFAULT_META_FIELD;
use crate::error::{CoreError, CoreResult};
use crate::metadata::{MetadataDocument, MetadataRecord};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key/value storage for an attachment's fields.
pub trait MetadataStore {
    fn read(&self, key: &str) -> CoreResult<Option<String>>;
    fn write(&mut self, key: &str, value: String) -> CoreResult<()>;
}

/// Keeps fields in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    fields: HashMap<String, String>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.fields.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: String) -> CoreResult<()> {
        self.fields.insert(key.to_string(), value);
        Ok(())
    }
}

/// Keeps fields in a JSON object on disk, `{field: document}`.
///
/// Values that are themselves JSON are stored inline so the file stays
/// readable; anything else is stored as a string.
#[derive(Debug, Clone)]
pub struct JsonFileMetadataStore {
    path: PathBuf,
}

impl JsonFileMetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&text)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(CoreError::MetadataStore(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl MetadataStore for JsonFileMetadataStore {
    fn read(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.load()?.remove(key).map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        }))
    }

    fn write(&mut self, key: &str, value: String) -> CoreResult<()> {
        let mut fields = self.load()?;
        let stored = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
        fields.insert(key.to_string(), stored);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&fields)?)?;
        log::debug!("Wrote metadata field '{}' to {}", key, self.path.display());
        Ok(())
    }
}

/// An attachment's metadata field inside a store.
pub struct Attachment<'a> {
    store: &'a mut dyn MetadataStore,
    field: String,
}

impl<'a> Attachment<'a> {
    /// Uses the default `meta` field.
    pub fn new(store: &'a mut dyn MetadataStore) -> Self {
        Self::with_field(store, DEFAULT_META_FIELD)
    }

    pub fn with_field(store: &'a mut dyn MetadataStore, field: impl Into<String>) -> Self {
        Self {
            store,
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The current style -> record document (empty when never written).
    pub fn meta(&self) -> CoreResult<MetadataDocument> {
        let stored = self.store.read(&self.field)?;
        MetadataDocument::parse(stored.as_deref())
    }

    /// Reads the document, sets `style`, and writes the whole document back.
    pub fn merge_style(&mut self, style: &str, record: &MetadataRecord) -> CoreResult<MetadataDocument> {
        let mut document = self.meta()?;
        document.insert(style, record)?;
        self.store.write(&self.field, document.to_json_string()?)?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SourceMetadata;
    use tempfile::tempdir;

    fn record(width: u32) -> MetadataRecord {
        MetadataRecord::new(SourceMetadata {
            width: Some(width),
            streams: 1,
            ..Default::default()
        })
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryMetadataStore::new();
        assert_eq!(store.read("meta").unwrap(), None);
        store.write("meta", "{}".to_string()).unwrap();
        assert_eq!(store.read("meta").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_attachment_merge_keeps_other_styles() {
        let mut store = MemoryMetadataStore::new();
        store
            .write("meta", r#"{"original":{"source":{"streams":3}}}"#.to_string())
            .unwrap();

        let mut attachment = Attachment::new(&mut store);
        attachment.merge_style("thumb", &record(320)).unwrap();
        attachment.merge_style("thumb", &record(640)).unwrap();

        let doc = attachment.meta().unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("thumb").unwrap().unwrap().source.width, Some(640));
        assert_eq!(doc.get("original").unwrap().unwrap().source.streams, 3);
    }

    #[test]
    fn test_attachment_custom_field() {
        let mut store = MemoryMetadataStore::new();
        Attachment::with_field(&mut store, "video_meta")
            .merge_style("default", &record(100))
            .unwrap();
        assert!(store.read("meta").unwrap().is_none());
        assert!(store.read("video_meta").unwrap().is_some());
    }

    #[test]
    fn test_json_file_store_persists_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("clip.meta.json");

        let mut store = JsonFileMetadataStore::new(&path);
        assert_eq!(store.read("meta").unwrap(), None);
        Attachment::new(&mut store)
            .merge_style("thumb", &record(320))
            .unwrap();
        store.write("note", "plain text".to_string()).unwrap();

        let reopened = JsonFileMetadataStore::new(&path);
        let doc = MetadataDocument::parse(reopened.read("meta").unwrap().as_deref()).unwrap();
        assert!(doc.contains("thumb"));
        assert_eq!(reopened.read("note").unwrap().as_deref(), Some("plain text"));

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk["meta"]["thumb"]["source"].is_object());
    }

    #[test]
    fn test_json_file_store_rejects_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1,2,3]").unwrap();
        let store = JsonFileMetadataStore::new(&path);
        assert!(matches!(store.read("meta"), Err(CoreError::MetadataStore(_))));
    }
}
