use snafu::prelude::*;

/// Mime type the remote store uses to mark a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// Reference from an object to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentReference {
    pub id: String,
    /// Set when the parent is the top-level drive root, which never shows up
    /// as an object of its own in a listing.
    pub is_root: bool,
}

impl ParentReference {
    pub fn new(id: impl Into<String>, is_root: bool) -> Self {
        Self {
            id: id.into(),
            is_root,
        }
    }
}

/// A single record of a flat remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parents: Vec<ParentReference>,
    pub trashed: bool,
}

impl RemoteObject {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        parent: ParentReference,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            parents: vec![parent],
            trashed: false,
        }
    }

    /// Returns the single parent of this object.
    ///
    /// The listing only ever carries the immediate parent, even though the
    /// field is a list. Anything else is malformed input.
    pub fn parent(&self) -> Result<&ParentReference, ObjectError> {
        ensure!(
            self.parents.len() <= 1,
            MultipleParentsSnafu {
                id: &self.id,
                count: self.parents.len(),
            }
        );
        self.parents
            .first()
            .context(MissingParentSnafu { id: &self.id })
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

#[derive(Debug, Snafu)]
pub enum ObjectError {
    #[snafu(display("Object '{}' has no parent", id))]
    MissingParent { id: String },
    #[snafu(display("Object '{}' has {} parents, expected exactly one", id, count))]
    MultipleParents { id: String, count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_returns_the_only_reference() {
        let object = RemoteObject::new(
            "a",
            "data",
            FOLDER_MIME_TYPE,
            ParentReference::new("r", true),
        );

        let parent = object.parent().expect("single parent should resolve");
        assert_eq!(parent.id, "r");
        assert!(parent.is_root);
        assert!(object.is_folder());
    }

    #[test]
    fn parent_rejects_multiple_references() {
        let mut object = RemoteObject::new(
            "a",
            "notes.txt",
            TEXT_MIME_TYPE,
            ParentReference::new("p1", false),
        );
        object.parents.push(ParentReference::new("p2", false));

        assert!(matches!(
            object.parent(),
            Err(ObjectError::MultipleParents { count: 2, .. })
        ));
        assert!(!object.is_folder());
    }

    #[test]
    fn parent_rejects_missing_reference() {
        let mut object = RemoteObject::new(
            "a",
            "notes.txt",
            TEXT_MIME_TYPE,
            ParentReference::new("p1", false),
        );
        object.parents.clear();

        let error = object.parent().unwrap_err();
        assert!(matches!(error, ObjectError::MissingParent { .. }));
        assert!(error.to_string().contains("'a'"));
    }
}
