/// Name given to the synthetic root directory.
pub const ROOT_NAME: &str = "root";
pub const PATH_SEPARATOR: char = '/';

/// Splits `path` into its non-empty segments, starting with [`ROOT_NAME`].
pub fn normalized_segments(path: &str) -> Vec<&str> {
    let mut segments = path
        .split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    if segments.first() != Some(&ROOT_NAME) {
        segments.insert(0, ROOT_NAME);
    }
    segments
}

pub fn normalized_path(path: &str) -> String {
    normalized_segments(path).join("/")
}

/// Splits `path` into the path of its parent and its own name.
///
/// Returns `None` for the root, which has neither.
pub fn split_parent(path: &str) -> Option<(String, &str)> {
    let segments = normalized_segments(path);
    let (name, parent) = segments.split_last()?;
    if parent.is_empty() {
        return None;
    }
    Some((parent.join("/"), *name))
}
