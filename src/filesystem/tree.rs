use std::collections::HashMap;

use derive_more::{Display, IsVariant};
use snafu::prelude::*;
use tracing::warn;

use crate::filesystem::object::{FOLDER_MIME_TYPE, RemoteObject};

/// Children of a directory, keyed by name.
pub type Children = HashMap<String, DriveNode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum NodeKind {
    #[display("directory")]
    Directory,
    #[display("file")]
    File,
}

impl NodeKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            NodeKind::Directory
        } else {
            NodeKind::File
        }
    }
}

/// A file or directory of the drive tree.
///
/// `children` is `Some` exactly when the node is a directory. Nodes only
/// point downwards, so every lookup starts from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveNode {
    name: String,
    id: String,
    mime_type: String,
    children: Option<Children>,
}

impl DriveNode {
    pub fn new(name: impl Into<String>, id: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let children = Self::initiate_children(NodeKind::from_mime_type(&mime_type));
        Self {
            name: name.into(),
            id: id.into(),
            mime_type,
            children,
        }
    }

    pub fn directory(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(name, id, FOLDER_MIME_TYPE)
    }

    pub fn initiate_children(kind: NodeKind) -> Option<Children> {
        match kind {
            NodeKind::Directory => Some(HashMap::new()),
            NodeKind::File => None,
        }
    }

    /// Inserts every given node under its name.
    ///
    /// A node whose name is already taken replaces the previous entry.
    pub fn update_children(
        &mut self,
        new_children: impl IntoIterator<Item = DriveNode>,
    ) -> Result<(), NodeError> {
        let Some(children) = self.children.as_mut() else {
            return CannotAssignChildrenSnafu { name: &self.name }.fail();
        };

        for child in new_children {
            let child_id = child.id.clone();
            if let Some(replaced) = children.insert(child.name.clone(), child) {
                warn!(
                    "Duplicate name '{}' in directory '{}': '{}' replaces '{}'",
                    replaced.name, self.name, child_id, replaced.id
                );
            }
        }

        Ok(())
    }

    pub fn ensure_accepts_children(&self) -> Result<(), NodeError> {
        ensure!(
            self.kind().is_directory() && self.children.is_some(),
            CannotAssignChildrenSnafu { name: &self.name }
        );
        Ok(())
    }

    pub fn get_child(&self, name: &str) -> Option<&DriveNode> {
        self.children.as_ref()?.get(name)
    }

    /// Removes and returns the named child.
    ///
    /// Must only be called on directories.
    pub fn remove_child(&mut self, name: &str) -> Result<DriveNode, NodeError> {
        debug_assert!(
            self.children.is_some(),
            "remove_child called on non-directory '{}'",
            self.name
        );
        self.children
            .as_mut()
            .and_then(|children| children.remove(name))
            .context(ChildNotFoundSnafu { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_mime_type(&self.mime_type)
    }

    pub fn children(&self) -> Option<&Children> {
        self.children.as_ref()
    }
}

// Deep chains would overflow the stack with the derived recursive drop.
impl Drop for DriveNode {
    fn drop(&mut self) {
        let Some(children) = self.children.take() else {
            return;
        };
        let mut pending = children.into_values().collect::<Vec<_>>();
        while let Some(mut node) = pending.pop() {
            if let Some(children) = node.children.take() {
                pending.extend(children.into_values());
            }
        }
    }
}

impl From<&RemoteObject> for DriveNode {
    fn from(object: &RemoteObject) -> Self {
        DriveNode::new(&object.name, &object.id, &object.mime_type)
    }
}

#[derive(Debug, Snafu)]
pub enum NodeError {
    #[snafu(display("Cannot assign children to non-directory '{}'", name))]
    CannotAssignChildren { name: String },
    #[snafu(display("File '{}' not found in directory", name))]
    ChildNotFound { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::object::TEXT_MIME_TYPE;

    fn gen_child(child_id: usize) -> DriveNode {
        DriveNode::directory(format!("child_{child_id}"), format!("child_id_{child_id}"))
    }

    fn child_ids(node: &DriveNode) -> Vec<&str> {
        let mut ids = node
            .children()
            .expect("node should be a directory")
            .values()
            .map(DriveNode::id)
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[test]
    fn test_properties_dir() {
        let node = DriveNode::new("test", "test_id", FOLDER_MIME_TYPE);
        assert_eq!(node.name(), "test");
        assert_eq!(node.id(), "test_id");
        assert_eq!(node.mime_type(), FOLDER_MIME_TYPE);
        assert_eq!(node.kind(), NodeKind::Directory);
        assert_eq!(node.kind().to_string(), "directory");
    }

    #[test]
    fn test_properties_non_dir() {
        let node = DriveNode::new("test", "test_id", TEXT_MIME_TYPE);
        assert_eq!(node.name(), "test");
        assert_eq!(node.id(), "test_id");
        assert_eq!(node.mime_type(), TEXT_MIME_TYPE);
        assert!(node.kind().is_file());
    }

    #[test]
    fn test_initiate_children() {
        assert_eq!(
            DriveNode::initiate_children(NodeKind::Directory),
            Some(HashMap::new())
        );
        assert_eq!(DriveNode::initiate_children(NodeKind::File), None);
        assert_eq!(
            DriveNode::new("test", "test_id", FOLDER_MIME_TYPE).children(),
            Some(&HashMap::new())
        );
        assert_eq!(DriveNode::new("test", "test_id", TEXT_MIME_TYPE).children(), None);
    }

    #[test]
    fn test_update_children_non_dir() {
        let mut node = DriveNode::new("test", "test_id", TEXT_MIME_TYPE);
        let result = node.update_children([gen_child(1)]);
        assert!(matches!(
            result,
            Err(NodeError::CannotAssignChildren { name }) if name == "test"
        ));
        assert_eq!(node.children(), None);
    }

    #[test]
    fn test_update_children_accumulates() {
        let mut node = DriveNode::directory("test", "test_id");

        node.update_children([gen_child(1)]).unwrap();
        assert_eq!(child_ids(&node), vec!["child_id_1"]);

        node.update_children([gen_child(2)]).unwrap();
        assert_eq!(child_ids(&node), vec!["child_id_1", "child_id_2"]);

        node.update_children([gen_child(3), gen_child(4)]).unwrap();
        assert_eq!(
            child_ids(&node),
            vec!["child_id_1", "child_id_2", "child_id_3", "child_id_4"]
        );
    }

    #[test]
    fn test_update_children_last_write_wins() {
        let mut node = DriveNode::directory("test", "test_id");
        let first = DriveNode::new("report.txt", "first", TEXT_MIME_TYPE);
        let second = DriveNode::new("report.txt", "second", TEXT_MIME_TYPE);

        node.update_children([first, second]).unwrap();

        assert_eq!(node.children().map(HashMap::len), Some(1));
        assert_eq!(node.get_child("report.txt").map(DriveNode::id), Some("second"));
    }

    #[test]
    fn test_get_child() {
        let mut node = DriveNode::directory("test", "test_id");
        node.update_children([gen_child(1)]).unwrap();

        assert_eq!(node.get_child("child_1").map(DriveNode::id), Some("child_id_1"));
        assert!(node.get_child("child_2").is_none());

        let file = DriveNode::new("file", "file_id", TEXT_MIME_TYPE);
        assert!(file.get_child("child_1").is_none());
    }

    #[test]
    fn test_remove_child() {
        let mut node = DriveNode::directory("test", "test_id");
        node.update_children([gen_child(1), gen_child(2)]).unwrap();

        let removed = node.remove_child("child_1").unwrap();
        assert_eq!(removed.id(), "child_id_1");
        assert_eq!(child_ids(&node), vec!["child_id_2"]);

        let result = node.remove_child("child_1");
        assert!(matches!(
            result,
            Err(NodeError::ChildNotFound { name }) if name == "child_1"
        ));
    }

    #[test]
    fn test_drop_deep_subtree() {
        let mut node = DriveNode::directory("d_0", "d_0");
        for i in 1..50_000 {
            let mut parent = DriveNode::directory(format!("d_{i}"), format!("d_{i}"));
            parent.update_children([node]).unwrap();
            node = parent;
        }
        assert_eq!(node.children().map(HashMap::len), Some(1));
        drop(node);
    }

    #[test]
    fn test_node_from_remote_object() {
        use crate::filesystem::object::ParentReference;

        let object = RemoteObject::new(
            "abc",
            "notes.txt",
            TEXT_MIME_TYPE,
            ParentReference::new("r", true),
        );
        let node = DriveNode::from(&object);
        assert_eq!(node.name(), "notes.txt");
        assert_eq!(node.id(), "abc");
        assert_eq!(node.children(), None);
    }
}
