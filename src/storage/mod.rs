mod drive_storage;
mod memory_store;
mod remote_store;
mod snapshot;

pub use drive_storage::{DriveStorage, StorageError};
pub use memory_store::MemoryStore;
pub use remote_store::{NewObject, RemoteError, RemoteStore};
pub use snapshot::{Snapshot, SnapshotEntry, SnapshotError};
