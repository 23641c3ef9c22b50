use std::collections::HashMap;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::item::{CURRENT_VERSION, Document};

pub const DOCUMENT_KEY: &str = "taskmedic:v2";

/// A string key-value backend. Values are opaque blobs; a `set` replaces
/// any previous value for the key in full.
pub trait KvStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct DocumentStore<S> {
    backend: S,
    key: String,
}

impl<S: KvStore> DocumentStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, DOCUMENT_KEY)
    }

    pub fn with_key(backend: S, key: &str) -> Self {
        Self {
            backend,
            key: key.to_string(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Loads the document, falling back to defaults when nothing is stored.
    /// A value that fails to parse is copied to `<key>.corrupt` and the
    /// default document is returned in its place.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn load(&mut self) -> anyhow::Result<Document> {
        let raw = self
            .backend
            .get(&self.key)
            .with_context(|| format!("failed reading {}", self.key))?;

        let Some(raw) = raw else {
            info!("no stored document; using defaults");
            return Ok(Document::default());
        };

        match serde_json::from_str::<Document>(&raw) {
            Ok(mut doc) => {
                if doc.version == 0 {
                    doc.version = CURRENT_VERSION;
                }
                debug!(items = doc.items.len(), version = doc.version, "loaded document");
                Ok(doc)
            }
            Err(err) => {
                warn!(error = %err, "stored document is unreadable; falling back to defaults");
                let backup_key = format!("{}.corrupt", self.key);
                self.backend
                    .set(&backup_key, &raw)
                    .with_context(|| format!("failed backing up unreadable {}", self.key))?;
                Ok(Document::default())
            }
        }
    }

    #[tracing::instrument(skip(self, doc), fields(key = %self.key, items = doc.items.len()))]
    pub fn save(&mut self, doc: &Document) -> anyhow::Result<()> {
        let serialized = serde_json::to_string(doc).context("failed serializing document")?;
        self.backend
            .set(&self.key, &serialized)
            .with_context(|| format!("failed writing {}", self.key))?;
        debug!(bytes = serialized.len(), "saved document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::checklist::{add_entry, add_progress_note};
    use crate::item::{Item, ItemKind, JobDetails, SortMode, StatusFilter};

    #[test]
    fn load_without_value_yields_defaults() {
        let mut store = DocumentStore::new(MemoryStore::new());
        let doc = store.load().expect("load");

        assert_eq!(doc, Document::default());
        assert_eq!(doc.version, CURRENT_VERSION);
        assert_eq!(doc.preferences.filter, StatusFilter::Open);
        assert_eq!(doc.preferences.sort, SortMode::Triage);
    }

    #[test]
    fn save_then_load_round_trips() {
        let now = Utc.timestamp_millis_opt(1_754_000_000_123).single().expect("valid");
        let mut item = Item::new(
            ItemKind::Job(JobDetails {
                ward: Some("AMU".to_string()),
                bed: Some("12".to_string()),
                summary: "?Sepsis - improving".to_string(),
            }),
            now,
        );
        item.tasks = add_entry(&item.tasks, "Cultures", now);
        item.progress = add_progress_note(&item.progress, "Abx given", now);
        item.review_by = Some(now);

        let mut doc = Document::default();
        doc.items.push(item);
        doc.preferences.search = "sepsis".to_string();

        let mut store = DocumentStore::new(MemoryStore::new());
        store.save(&doc).expect("save");
        assert_eq!(store.load().expect("load"), doc);
    }

    #[test]
    fn partial_document_is_backfilled() {
        let mut backend = MemoryStore::new();
        backend
            .set(DOCUMENT_KEY, r#"{"items":[]}"#)
            .expect("seed");
        let mut store = DocumentStore::new(backend);

        let doc = store.load().expect("load");
        assert_eq!(doc.version, CURRENT_VERSION);
        assert_eq!(doc.preferences, Default::default());
    }

    #[test]
    fn corrupt_value_fails_closed_and_is_preserved() {
        let mut backend = MemoryStore::new();
        backend.set(DOCUMENT_KEY, "{not json").expect("seed");
        let mut store = DocumentStore::new(backend);

        assert_eq!(store.load().expect("load"), Document::default());
        assert_eq!(store.backend().raw("taskmedic:v2.corrupt"), Some("{not json"));
    }

    struct FailingStore;

    impl KvStore for FailingStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    #[test]
    fn save_failure_surfaces_with_context() {
        let mut store = DocumentStore::new(FailingStore);
        let err = store.save(&Document::default()).expect_err("save should fail");
        assert!(format!("{err:#}").contains("quota exceeded"));
    }
}
