use snafu::prelude::*;
use tracing::{debug, info};

use crate::filesystem::{
    BuildError, FOLDER_MIME_TYPE, FilesystemIndex, IndexError, TEXT_MIME_TYPE, normalized_path,
    split_parent,
};
use crate::storage::remote_store::{NewObject, RemoteError, RemoteStore};

/// Path-based access to a remote store.
///
/// Owns the only [`FilesystemIndex`] built from the store, and rebuilds it
/// after every mutation so queries always see the store's current listing.
#[derive(Debug)]
pub struct DriveStorage<S> {
    store: S,
    fs: FilesystemIndex,
}

impl<S: RemoteStore> DriveStorage<S> {
    pub async fn connect(store: S) -> Result<Self, StorageError> {
        let mut storage = Self {
            store,
            fs: FilesystemIndex::new(),
        };
        storage.rebuild().await?;
        Ok(storage)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> &FilesystemIndex {
        &self.fs
    }

    /// Pulls the full listing and replaces the local tree with it.
    pub async fn rebuild(&mut self) -> Result<(), StorageError> {
        let objects = self.store.list_objects().await.context(RemoteSnafu)?;
        debug!("Fetched {} objects from remote store", objects.len());
        self.fs
            .build_with_root(&objects, self.store.root_id())
            .context(BuildSnafu)
    }

    pub fn list_files(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let names = self.fs.list_file(path).context(IndexSnafu)?;
        Ok(names.into_iter().map(str::to_string).collect())
    }

    /// Returns the remote id of the object at `path`, if there is one.
    pub fn path_exists(&self, path: &str) -> Result<Option<String>, StorageError> {
        let node = self.fs.file_exists(path).context(IndexSnafu)?;
        Ok(node.map(|node| node.id().to_string()))
    }

    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let id = self.fs.resolve(path).context(IndexSnafu)?.id().to_string();
        self.store.fetch_content(&id).await.context(RemoteSnafu)
    }

    /// Creates a text file holding `content`, or a folder when there is none.
    pub async fn create_file(
        &mut self,
        path: &str,
        content: Option<String>,
    ) -> Result<String, StorageError> {
        let (parent_path, name) = split_parent(path).context(InvalidPathSnafu { path })?;
        let parent = self.fs.resolve_folder(&parent_path).context(IndexSnafu)?;
        ensure!(
            parent.get_child(name).is_none(),
            AlreadyExistsSnafu {
                path: normalized_path(path),
            }
        );

        let mime_type = match content {
            Some(_) => TEXT_MIME_TYPE,
            None => FOLDER_MIME_TYPE,
        };
        let request = NewObject {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            parent_id: parent.id().to_string(),
            content,
        };
        let id = self
            .store
            .create_object(request)
            .await
            .context(RemoteSnafu)?;
        info!("Created {} as '{}'", normalized_path(path), id);

        self.rebuild().await?;
        ensure!(
            self.fs.file_exists(path).context(IndexSnafu)?.is_some(),
            UnsettledSnafu {
                path: normalized_path(path),
            }
        );
        Ok(id)
    }

    /// Deletes the object at `path`.
    ///
    /// Only the object itself is deleted; entries below a deleted folder stay
    /// in the store but drop out of the tree.
    pub async fn delete_file(&mut self, path: &str) -> Result<(), StorageError> {
        ensure!(split_parent(path).is_some(), CannotDeleteRootSnafu);
        let id = self.fs.resolve(path).context(IndexSnafu)?.id().to_string();

        self.store.delete_object(&id).await.context(RemoteSnafu)?;
        info!("Deleted {} ('{}')", normalized_path(path), id);

        self.rebuild().await?;
        ensure!(
            self.fs.file_exists(path).context(IndexSnafu)?.is_none(),
            UnsettledSnafu {
                path: normalized_path(path),
            }
        );
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum StorageError {
    #[snafu(display("Remote store operation failed"))]
    RemoteError { source: RemoteError },
    #[snafu(display("Failed to build the filesystem index"))]
    BuildError { source: BuildError },
    #[snafu(display("Failed to resolve path"))]
    IndexError { source: IndexError },
    #[snafu(display("'{}' does not name a file or folder below the root", path))]
    InvalidPath { path: String },
    #[snafu(display("'{}' already exists", path))]
    AlreadyExists { path: String },
    #[snafu(display("The root folder cannot be deleted"))]
    CannotDeleteRoot,
    #[snafu(display("Listing does not reflect the change to '{}' yet", path))]
    Unsettled { path: String },
}
