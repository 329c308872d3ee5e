use colored::Colorize;
use snafu::prelude::*;

use crate::cli::Command;
use crate::filesystem::{DriveNode, IndexError, normalized_path};
use crate::storage::{DriveStorage, RemoteStore, StorageError};

/// Runs a single command and returns the lines it prints.
pub async fn execute<S: RemoteStore>(
    storage: &mut DriveStorage<S>,
    command: &Command,
) -> Result<Vec<String>, CommandError> {
    let lines = match command {
        Command::Ls { path } => {
            let folder = storage.index().resolve_folder(path).context(LookupSnafu)?;
            sorted_children(folder).into_iter().map(entry_label).collect()
        }
        Command::Id { path } => {
            let id = storage
                .path_exists(path)
                .context(StorageSnafu)?
                .context(NotFoundSnafu {
                    path: normalized_path(path),
                })?;
            vec![id]
        }
        Command::Stat { path } => {
            let node = storage.index().resolve(path).context(LookupSnafu)?;
            let mut lines = vec![
                format!("path: {}", normalized_path(path)),
                format!("name: {}", node.name()),
                format!("id: {}", node.id()),
                format!("type: {} ({})", node.kind(), node.mime_type()),
            ];
            if let Some(children) = node.children() {
                lines.push(format!("entries: {}", children.len()));
            }
            lines
        }
        Command::Tree { path } => {
            let node = storage.index().resolve(path).context(LookupSnafu)?;
            render_tree(node)
        }
        Command::Cat { path } => {
            let bytes = storage.read_file(path).await.context(StorageSnafu)?;
            vec![String::from_utf8_lossy(&bytes).into_owned()]
        }
        Command::Mkdir { path } => {
            let id = storage
                .create_file(path, None)
                .await
                .context(StorageSnafu)?;
            vec![id]
        }
        Command::Put { path, content } => {
            let id = storage
                .create_file(path, Some(content.clone()))
                .await
                .context(StorageSnafu)?;
            vec![id]
        }
        Command::Rm { path } => {
            storage.delete_file(path).await.context(StorageSnafu)?;
            Vec::new()
        }
    };

    Ok(lines)
}

fn sorted_children(node: &DriveNode) -> Vec<&DriveNode> {
    let mut children = node
        .children()
        .map(|children| children.values().collect::<Vec<_>>())
        .unwrap_or_default();
    children.sort_by(|a, b| a.name().cmp(b.name()));
    children
}

fn entry_label(node: &DriveNode) -> String {
    if node.kind().is_directory() {
        format!("{}/", node.name()).blue().bold().to_string()
    } else {
        node.name().to_string()
    }
}

fn render_tree(root: &DriveNode) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        lines.push(format!("{}{}", "  ".repeat(depth), entry_label(node)));
        let children = sorted_children(node).into_iter().rev();
        stack.extend(children.map(|child| (child, depth + 1)));
    }
    lines
}

#[derive(Debug, Snafu)]
pub enum CommandError {
    #[snafu(display("Drive operation failed"))]
    StorageError { source: StorageError },
    #[snafu(display("Path lookup failed"))]
    LookupError { source: IndexError },
    #[snafu(display("'{}' doesn't exist", path))]
    NotFound { path: String },
}
