//! Path-addressable tree over a flat remote listing.
//!
//! The remote store only knows objects with a single parent reference. This
//! module turns such a listing into a rooted tree of [`DriveNode`]s and
//! resolves `/`-separated paths against it.

mod index;
mod object;
mod path;
mod tree;

pub use index::{BuildError, FilesystemIndex, IndexError};
pub use object::{FOLDER_MIME_TYPE, ObjectError, ParentReference, RemoteObject, TEXT_MIME_TYPE};
pub use path::{ROOT_NAME, normalized_path, split_parent};
pub use tree::{Children, DriveNode, NodeError, NodeKind};
