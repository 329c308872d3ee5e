use std::hash::Hasher;
use std::path::Path;

use hashlink::LinkedHashMap;
use metrohash::MetroHash64;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::filesystem::{ParentReference, RemoteObject};
use crate::storage::remote_store::{
    NewObject, NoContentSnafu, RemoteError, RemoteStore, UnknownObjectSnafu,
};
use crate::storage::snapshot::{Snapshot, SnapshotEntry, SnapshotError};

/// Remote store kept in memory and persisted as a YAML [`Snapshot`].
///
/// Objects keep the order in which they were added, so listings come back
/// the same way every time.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    root_id: Option<String>,
    objects: LinkedHashMap<String, SnapshotEntry>,
    sequence: u64,
}

impl MemoryStore {
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root_id: Some(root_id.into()),
            ..Self::default()
        }
    }

    pub async fn load(path: &Path) -> Result<Self, SnapshotError> {
        let snapshot = Snapshot::read(path).await?;
        Ok(Self::from(snapshot))
    }

    pub async fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        self.to_snapshot().write(path).await?;
        info!("Saved drive snapshot to {}", path.display());
        Ok(())
    }

    /// Adds an object as if it had been listed remotely.
    pub fn insert(&mut self, object: RemoteObject, content: Option<String>) {
        self.objects
            .insert(object.id.clone(), SnapshotEntry { object, content });
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            root_id: self.root_id.clone(),
            entries: self.objects.values().cloned().collect(),
        }
    }

    fn next_id(&mut self, parent_id: &str, name: &str) -> String {
        loop {
            self.sequence += 1;
            let mut hasher = MetroHash64::default();
            hasher.write(parent_id.as_bytes());
            hasher.write(name.as_bytes());
            hasher.write_u64(self.sequence);
            let id = format!("{:016x}", hasher.finish());

            if !self.objects.contains_key(&id) && self.root_id() != Some(id.as_str()) {
                return id;
            }
        }
    }
}

impl From<Snapshot> for MemoryStore {
    fn from(snapshot: Snapshot) -> Self {
        let root_id = snapshot.effective_root_id().map(str::to_string);
        let sequence = snapshot.entries.len() as u64;
        let objects = snapshot
            .entries
            .into_iter()
            .map(|entry| (entry.object.id.clone(), entry))
            .collect();
        Self {
            root_id,
            objects,
            sequence,
        }
    }
}

impl RemoteStore for MemoryStore {
    async fn list_objects(&self) -> Result<Vec<RemoteObject>, RemoteError> {
        Ok(self
            .objects
            .values()
            .filter(|entry| !entry.object.trashed)
            .map(|entry| entry.object.clone())
            .collect())
    }

    async fn create_object(&mut self, object: NewObject) -> Result<String, RemoteError> {
        let is_root = self.root_id() == Some(object.parent_id.as_str());
        ensure!(
            is_root || self.objects.contains_key(&object.parent_id),
            UnknownObjectSnafu {
                id: &object.parent_id,
            }
        );

        let id = self.next_id(&object.parent_id, &object.name);
        debug!("Creating '{}' as '{}' under '{}'", object.name, id, object.parent_id);
        let remote = RemoteObject::new(
            &id,
            object.name,
            object.mime_type,
            ParentReference::new(object.parent_id, is_root),
        );
        self.insert(remote, object.content);
        Ok(id)
    }

    async fn delete_object(&mut self, id: &str) -> Result<(), RemoteError> {
        self.objects
            .remove(id)
            .map(|_| ())
            .context(UnknownObjectSnafu { id })
    }

    async fn fetch_content(&self, id: &str) -> Result<Vec<u8>, RemoteError> {
        let entry = self.objects.get(id).context(UnknownObjectSnafu { id })?;
        entry
            .content
            .as_ref()
            .map(|content| content.clone().into_bytes())
            .context(NoContentSnafu { id })
    }

    fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::{FOLDER_MIME_TYPE, TEXT_MIME_TYPE};

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new("R");
        store.insert(
            RemoteObject::new("A", "data", FOLDER_MIME_TYPE, ParentReference::new("R", true)),
            None,
        );
        store.insert(
            RemoteObject::new("B", "a.txt", TEXT_MIME_TYPE, ParentReference::new("A", false)),
            Some("alpha".to_string()),
        );
        store
    }

    fn new_object(name: &str, parent_id: &str, content: Option<&str>) -> NewObject {
        NewObject {
            name: name.to_string(),
            mime_type: TEXT_MIME_TYPE.to_string(),
            parent_id: parent_id.to_string(),
            content: content.map(str::to_string),
        }
    }

    #[compio::test]
    async fn lists_objects_in_insertion_order_without_trash() {
        let mut store = store();
        let mut trashed =
            RemoteObject::new("T", "old.txt", TEXT_MIME_TYPE, ParentReference::new("A", false));
        trashed.trashed = true;
        store.insert(trashed, None);

        let ids = store
            .list_objects()
            .await
            .unwrap()
            .into_iter()
            .map(|object| object.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[compio::test]
    async fn create_object_assigns_fresh_ids() {
        let mut store = store();

        let first = store
            .create_object(new_object("b.txt", "A", Some("beta")))
            .await
            .unwrap();
        let second = store
            .create_object(new_object("b.txt", "A", Some("beta")))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), 16);
        assert_eq!(store.fetch_content(&first).await.unwrap(), b"beta".to_vec());
    }

    #[compio::test]
    async fn create_object_marks_top_level_parent_as_root() {
        let mut store = store();
        let id = store
            .create_object(new_object("top.txt", "R", None))
            .await
            .unwrap();

        let objects = store.list_objects().await.unwrap();
        let created = objects.iter().find(|object| object.id == id).unwrap();
        assert_eq!(created.parents, vec![ParentReference::new("R", true)]);
    }

    #[compio::test]
    async fn create_object_under_unknown_parent_fails() {
        let mut store = store();
        let result = store.create_object(new_object("x", "missing", None)).await;
        assert!(matches!(result, Err(RemoteError::UnknownObject { id }) if id == "missing"));
    }

    #[compio::test]
    async fn delete_and_fetch_errors() {
        let mut store = store();

        assert!(matches!(
            store.fetch_content("A").await,
            Err(RemoteError::NoContent { .. })
        ));
        store.delete_object("B").await.unwrap();
        assert!(matches!(
            store.delete_object("B").await,
            Err(RemoteError::UnknownObject { .. })
        ));
        assert!(matches!(
            store.fetch_content("B").await,
            Err(RemoteError::UnknownObject { .. })
        ));
    }

    #[compio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("drive.yaml");
        let store = store();

        store.save(&path).await.unwrap();
        let loaded = MemoryStore::load(&path).await.unwrap();

        assert_eq!(loaded.root_id(), Some("R"));
        assert_eq!(
            loaded.list_objects().await.unwrap(),
            store.list_objects().await.unwrap()
        );
        assert_eq!(loaded.fetch_content("B").await.unwrap(), b"alpha".to_vec());
    }
}
