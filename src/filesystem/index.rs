use std::collections::HashMap;
use std::sync::Arc;

use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::filesystem::object::{ObjectError, ParentReference, RemoteObject};
use crate::filesystem::path::{ROOT_NAME, normalized_path, normalized_segments};
use crate::filesystem::tree::{DriveNode, NodeError};

/// Path-addressable view over a flat remote listing.
///
/// Each [`build`](Self::build) produces a fresh tree and swaps it in as a
/// whole. Readers that need a snapshot surviving the next rebuild can hold on
/// to [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct FilesystemIndex {
    root: Option<Arc<DriveNode>>,
}

impl FilesystemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Result<&DriveNode, IndexError> {
        self.root.as_deref().context(RootNotDefinedSnafu)
    }

    pub fn snapshot(&self) -> Result<Arc<DriveNode>, IndexError> {
        self.root.clone().context(RootNotDefinedSnafu)
    }

    /// Rebuilds the whole tree from a flat listing.
    ///
    /// Children may be listed before their parents, so nodes are materialized
    /// first and linked in a second pass. The previous tree stays in place if
    /// the listing is rejected.
    pub fn build(&mut self, objects: &[RemoteObject]) -> Result<(), BuildError> {
        self.build_with_root(objects, None)
    }

    /// Same as [`build`](Self::build), for callers that already know the id
    /// of the drive root.
    ///
    /// The root then exists even when no listed object points at it, so an
    /// empty drive still builds.
    pub fn build_with_root(
        &mut self,
        objects: &[RemoteObject],
        known_root_id: Option<&str>,
    ) -> Result<(), BuildError> {
        let parents = objects
            .iter()
            .map(RemoteObject::parent)
            .collect::<Result<Vec<_>, _>>()
            .context(InvalidObjectSnafu)?;

        let (mut nodes, root_ids) = Self::materialize(objects, &parents, known_root_id);
        let links = Self::link(objects, &parents, &nodes)?;

        if root_ids.len() > 1 {
            warn!(
                "Listing references {} top-level roots, using '{}'",
                root_ids.len(),
                root_ids[0]
            );
        }
        let root_id = root_ids
            .first()
            .copied()
            .filter(|id| {
                nodes
                    .get(id)
                    .is_some_and(|node| node.name() == ROOT_NAME && node.kind().is_directory())
            })
            .context(RootNotFoundSnafu)?;

        let node_count = nodes.len();
        let root = Self::assemble(root_id, &mut nodes, &links)
            .context(ParentNotAFolderSnafu)?
            .context(RootNotFoundSnafu)?;
        if !nodes.is_empty() {
            debug!("{} nodes are unreachable from the root", nodes.len());
        }
        info!(
            "Built filesystem index: {} of {} nodes reachable",
            node_count - nodes.len(),
            node_count
        );

        self.root = Some(Arc::new(root));
        Ok(())
    }

    /// First pass: one node per object, plus the synthetic root the first time
    /// an object points at it.
    fn materialize<'a>(
        objects: &'a [RemoteObject],
        parents: &[&'a ParentReference],
        known_root_id: Option<&'a str>,
    ) -> (HashMap<&'a str, DriveNode>, Vec<&'a str>) {
        let mut nodes = HashMap::with_capacity(objects.len() + 1);
        let mut root_ids = Vec::new();

        if let Some(root_id) = known_root_id {
            nodes.insert(root_id, DriveNode::directory(ROOT_NAME, root_id));
            root_ids.push(root_id);
        }

        for (object, &parent) in objects.iter().zip(parents) {
            if parent.is_root && !nodes.contains_key(parent.id.as_str()) {
                nodes.insert(
                    parent.id.as_str(),
                    DriveNode::directory(ROOT_NAME, &parent.id),
                );
                root_ids.push(parent.id.as_str());
            }
            nodes.insert(object.id.as_str(), DriveNode::from(object));
        }

        (nodes, root_ids)
    }

    /// Second pass: child ids per parent id, in listing order.
    fn link<'a>(
        objects: &'a [RemoteObject],
        parents: &[&'a ParentReference],
        nodes: &HashMap<&'a str, DriveNode>,
    ) -> Result<HashMap<&'a str, Vec<&'a str>>, BuildError> {
        let mut links: HashMap<&str, Vec<&str>> = HashMap::new();

        for (object, &parent) in objects.iter().zip(parents) {
            // Children of a folder deleted remotely can outlive it in the listing
            let Some(parent_node) = nodes.get(parent.id.as_str()) else {
                debug!(
                    "Skipping '{}' ({}): parent '{}' not in listing",
                    object.name, object.id, parent.id
                );
                continue;
            };
            parent_node
                .ensure_accepts_children()
                .context(ParentNotAFolderSnafu)?;
            links
                .entry(parent.id.as_str())
                .or_default()
                .push(object.id.as_str());
        }

        Ok(links)
    }

    /// Moves the node `root_id` out of `nodes` with its subtree attached.
    ///
    /// Walks depth-first with an explicit stack. A node is attached to its
    /// parent once all of its own children are attached.
    fn assemble<'a>(
        root_id: &'a str,
        nodes: &mut HashMap<&'a str, DriveNode>,
        links: &HashMap<&'a str, Vec<&'a str>>,
    ) -> Result<Option<DriveNode>, NodeError> {
        let pending = |id: &str| links.get(id).map(Vec::as_slice).unwrap_or_default().iter();

        let Some(root) = nodes.remove(root_id) else {
            return Ok(None);
        };
        let mut stack = vec![(root, pending(root_id), Vec::new())];

        while let Some((_, child_ids, _)) = stack.last_mut() {
            if let Some(&child_id) = child_ids.next() {
                if let Some(child) = nodes.remove(child_id) {
                    stack.push((child, pending(child_id), Vec::new()));
                }
                continue;
            }

            let Some((mut node, _, children)) = stack.pop() else {
                break;
            };
            if !children.is_empty() {
                node.update_children(children)?;
            }
            match stack.last_mut() {
                Some((_, _, siblings)) => siblings.push(node),
                None => return Ok(Some(node)),
            }
        }

        Ok(None)
    }

    /// Resolves `path` against the current tree.
    ///
    /// The first segment is checked against the root's own name, every later
    /// segment is looked up among the children of the node before it.
    pub fn file_exists(&self, path: &str) -> Result<Option<&DriveNode>, IndexError> {
        let mut current = self.root()?;
        let segments = normalized_segments(path);
        debug!("Checking if {} exists...", segments.join("/"));

        let mut remaining = segments.iter().peekable();
        while let Some(segment) = remaining.next() {
            if current.name() != *segment {
                return Ok(None);
            }
            let Some(next_name) = remaining.peek() else {
                return Ok(Some(current));
            };
            match current.get_child(next_name) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        Ok(None)
    }

    pub fn resolve(&self, path: &str) -> Result<&DriveNode, IndexError> {
        self.file_exists(path)?.context(FileNotFoundSnafu {
            path: normalized_path(path),
        })
    }

    pub fn resolve_folder(&self, path: &str) -> Result<&DriveNode, IndexError> {
        let node = self.resolve(path)?;
        ensure!(
            node.kind().is_directory() && node.children().is_some(),
            NotAFolderSnafu {
                path: normalized_path(path),
            }
        );
        Ok(node)
    }

    /// Names of the entries of the folder at `path`, in no particular order.
    pub fn list_file(&self, path: &str) -> Result<Vec<&str>, IndexError> {
        let folder = self.resolve_folder(path)?;
        Ok(folder
            .children()
            .map(|children| children.values().map(DriveNode::name).collect())
            .unwrap_or_default())
    }
}

#[derive(Debug, Snafu)]
pub enum IndexError {
    #[snafu(display("Filesystem root is not defined, build the index first"))]
    RootNotDefined,
    #[snafu(display("Path '{}' doesn't exist", path))]
    FileNotFound { path: String },
    #[snafu(display("Path '{}' is not a folder", path))]
    NotAFolder { path: String },
}

#[derive(Debug, Snafu)]
pub enum BuildError {
    #[snafu(display("Listing contains a malformed object"))]
    InvalidObject { source: ObjectError },
    #[snafu(display("Listing attaches an object to a file"))]
    ParentNotAFolder { source: NodeError },
    #[snafu(display("Listing does not reference a top-level root"))]
    RootNotFound,
}
