use super::memory::{InMemorySource, Mutation};
use super::{
    CollectionPath, Document, DocumentPath, Fields, FilterSpec, RemoteSource, SourceEvent,
    SubscriptionId,
};
use crate::error::Result;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Document store kept in a single JSON file.
///
/// The whole store is loaded on open and rewritten after every successful
/// write. Live queries are served by an [`InMemorySource`] and only live as
/// long as this process.
///
/// A write counts only once it is on disk: if the file cannot be rewritten the
/// change is undone and live queries never see it.
pub struct FileSource {
    inner: InMemorySource,
    data_file: PathBuf,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(data_file: P) -> Result<Self> {
        let data_file = data_file.as_ref().to_path_buf();
        let collections: BTreeMap<CollectionPath, Vec<Document>> = if data_file.exists() {
            let content = fs::read_to_string(&data_file)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        debug!(
            "opened {} ({} collections)",
            data_file.display(),
            collections.len()
        );
        Ok(Self {
            inner: InMemorySource::from_collections(collections),
            data_file,
        })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.data_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        // Atomic: write to tmp then rename.
        let tmp = self.data_file.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&self.inner.collections())?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.data_file)?;
        Ok(())
    }

    fn commit(&self, path: &DocumentPath, mutation: Mutation) -> Result<()> {
        let before = self.inner.collections();
        if !self.inner.apply(path, mutation)? {
            return Ok(());
        }
        if let Err(e) = self.persist() {
            warn!("write to {} not saved, rolling back: {}", path, e);
            self.inner.restore(before);
            return Err(e);
        }
        self.inner.notify(path.collection());
        Ok(())
    }
}

impl RemoteSource for FileSource {
    fn subscribe(&self, collection: &CollectionPath, filter: FilterSpec) -> Result<SubscriptionId> {
        self.inner.subscribe(collection, filter)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.inner.unsubscribe(subscription)
    }

    fn fetch(&self, collection: &CollectionPath, filter: &FilterSpec) -> Result<Vec<Document>> {
        self.inner.fetch(collection, filter)
    }

    fn write(&self, path: &DocumentPath, fields: Fields) -> Result<()> {
        self.commit(path, Mutation::Write(fields))
    }

    fn update(&self, path: &DocumentPath, fields: Fields) -> Result<()> {
        self.commit(path, Mutation::Update(fields))
    }

    fn delete(&self, path: &DocumentPath) -> Result<()> {
        self.commit(path, Mutation::Delete)
    }

    fn increment_field(&self, path: &DocumentPath, field: &str, delta: i64) -> Result<()> {
        self.commit(
            path,
            Mutation::Increment {
                field: field.to_string(),
                delta,
            },
        )
    }

    fn poll_events(&self) -> Vec<SourceEvent> {
        self.inner.poll_events()
    }
}
