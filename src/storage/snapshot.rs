use std::borrow::Cow;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml, YamlEmitter};
use snafu::prelude::*;
use tracing::debug;

use crate::filesystem::{ParentReference, RemoteObject};

/// Drive state persisted between runs: the flat listing and text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub root_id: Option<String>,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub object: RemoteObject,
    pub content: Option<String>,
}

fn key(name: &'static str) -> Yaml<'static> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

fn string_value(value: &str) -> Yaml<'_> {
    Yaml::Value(Scalar::String(Cow::Borrowed(value)))
}

impl Snapshot {
    pub async fn read(path: &Path) -> Result<Self, SnapshotError> {
        debug!("Reading drive snapshot: {}", path.display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            path: path.to_path_buf(),
        })?;
        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            path: path.to_path_buf(),
        })?;
        let snapshot = Snapshot::try_from(contents.as_str())?;
        debug!("Read {} objects from snapshot", snapshot.entries.len());
        Ok(snapshot)
    }

    pub async fn write(&self, path: &Path) -> Result<(), SnapshotError> {
        let contents = self.to_yaml_string()?;
        let result = fs::write(path, contents.into_bytes()).await;
        result.0.context(WriteSnafu {
            path: path.to_path_buf(),
        })?;
        debug!("Wrote {} objects to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Id of the drive root: declared explicitly, or taken from the first
    /// object that hangs directly off it.
    pub fn effective_root_id(&self) -> Option<&str> {
        self.root_id.as_deref().or_else(|| {
            self.entries
                .iter()
                .flat_map(|entry| &entry.object.parents)
                .find(|parent| parent.is_root)
                .map(|parent| parent.id.as_str())
        })
    }

    pub fn to_yaml_string(&self) -> Result<String, SnapshotError> {
        let objects = self.entries.iter().map(Self::entry_to_yaml).collect();

        let mut top_level = LinkedHashMap::new();
        if let Some(root_id) = &self.root_id {
            top_level.insert(key("root_id"), string_value(root_id));
        }
        top_level.insert(key("objects"), Yaml::Sequence(objects));

        let document = Yaml::Mapping(top_level);
        let mut out = String::new();
        {
            let mut emitter = YamlEmitter::new(&mut out);
            emitter.dump(&document).context(EmitSnafu)?;
        }
        out.push('\n');
        Ok(out)
    }

    fn entry_to_yaml(entry: &SnapshotEntry) -> Yaml<'_> {
        let object = &entry.object;
        let parents = object
            .parents
            .iter()
            .map(|parent| {
                let mut map = LinkedHashMap::new();
                map.insert(key("id"), string_value(&parent.id));
                map.insert(key("isRoot"), Yaml::Value(Scalar::Boolean(parent.is_root)));
                Yaml::Mapping(map)
            })
            .collect();

        let mut map = LinkedHashMap::new();
        map.insert(key("id"), string_value(&object.id));
        map.insert(key("title"), string_value(&object.name));
        map.insert(key("mimeType"), string_value(&object.mime_type));
        if object.trashed {
            map.insert(key("trashed"), Yaml::Value(Scalar::Boolean(true)));
        }
        if let Some(content) = &entry.content {
            map.insert(key("content"), string_value(content));
        }
        map.insert(key("parents"), Yaml::Sequence(parents));
        Yaml::Mapping(map)
    }

    fn parse_entry(
        index: usize,
        entry: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<SnapshotEntry, SnapshotError> {
        let required = |field: &'static str| {
            entry
                .get(&key(field))
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .context(InvalidObjectSnafu { index, field })
        };
        let id = required("id")?;
        let name = required("title")?;
        let mime_type = required("mimeType")?;

        let trashed = match entry.get(&key("trashed")) {
            None => false,
            Some(Yaml::Value(Scalar::Boolean(trashed))) => *trashed,
            Some(_) => return InvalidObjectSnafu { index, field: "trashed" }.fail(),
        };

        let content = match entry.get(&key("content")) {
            None => None,
            Some(value) => Some(
                value
                    .as_str()
                    .map(str::to_string)
                    .context(InvalidObjectSnafu { index, field: "content" })?,
            ),
        };

        let parents = entry
            .get(&key("parents"))
            .and_then(|value| value.as_sequence())
            .context(InvalidObjectSnafu { index, field: "parents" })?
            .iter()
            .map(|parent| Self::parse_parent(index, parent))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SnapshotEntry {
            object: RemoteObject {
                id,
                name,
                mime_type,
                parents,
                trashed,
            },
            content,
        })
    }

    fn parse_parent(index: usize, parent: &Yaml) -> Result<ParentReference, SnapshotError> {
        let parent = parent
            .as_mapping()
            .context(InvalidObjectSnafu { index, field: "parents" })?;
        let id = parent
            .get(&key("id"))
            .and_then(|value| value.as_str())
            .context(InvalidObjectSnafu { index, field: "parents.id" })?;
        let is_root = match parent.get(&key("isRoot")) {
            None => false,
            Some(Yaml::Value(Scalar::Boolean(is_root))) => *is_root,
            Some(_) => return InvalidObjectSnafu { index, field: "parents.isRoot" }.fail(),
        };
        Ok(ParentReference::new(id, is_root))
    }
}

impl TryFrom<&str> for Snapshot {
    type Error = SnapshotError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents.first().context(MalformedSnapshotSnafu)?;
        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        let root_id = match top_level.get(&key("root_id")) {
            None => None,
            Some(value) => Some(
                value
                    .as_str()
                    .map(str::to_string)
                    .context(MalformedSnapshotSnafu)?,
            ),
        };

        let entries = match top_level.get(&key("objects")) {
            None => Vec::new(),
            Some(objects) => objects
                .as_sequence()
                .context(ObjectsNotSequenceSnafu)?
                .iter()
                .enumerate()
                .map(|(index, object)| {
                    let object = object
                        .as_mapping()
                        .context(InvalidObjectSnafu { index, field: "object" })?;
                    Self::parse_entry(index, object)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Snapshot { root_id, entries })
    }
}

#[derive(Debug, Snafu)]
pub enum SnapshotError {
    #[snafu(display("Failed to read the snapshot file: {}", path.display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Snapshot file is not valid UTF-8: {}", path.display()))]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to write the snapshot file: {}", path.display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse the snapshot file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Failed to serialize the snapshot"))]
    EmitError { source: saphyr::EmitError },
    #[snafu(display("Improperly formatted snapshot file"))]
    MalformedSnapshot,
    #[snafu(display("Top level of snapshot should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Objects section should be a list"))]
    ObjectsNotSequence,
    #[snafu(display("Object #{} has a missing or invalid '{}' field", index, field))]
    InvalidObject { index: usize, field: &'static str },
}
