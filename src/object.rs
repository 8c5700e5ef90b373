//! Host-facing file objects and repo path helpers.

use serde::Serialize;

/// One file or directory as the host sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExposedObject {
    pub id: String,
    pub name: String,
    pub path: String,
    pub size: i64,
    /// Seconds since the Unix epoch. Directories report zero.
    pub modified: i64,
    pub is_dir: bool,
}

impl ExposedObject {
    /// A directory handle for `path`, e.g. the configured root.
    pub fn dir(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = trim_slashes(&path)
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        ExposedObject {
            id: path.clone(),
            name,
            path,
            size: 0,
            modified: 0,
            is_dir: true,
        }
    }

    /// A file handle for `path`.
    pub fn file(path: impl Into<String>) -> Self {
        ExposedObject {
            is_dir: false,
            ..ExposedObject::dir(path)
        }
    }
}

/// Strips leading and trailing slashes.
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// Turns a host path into a repo-relative one by removing the configured root.
///
/// The result never starts with a slash; the root itself maps to `""`.
pub fn strip_root<'a>(path: &'a str, root: &str) -> &'a str {
    let trimmed = trim_slashes(path);
    let root = trim_slashes(root);
    if root.is_empty() {
        return trimmed;
    }
    match trimmed.strip_prefix(root) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => trim_slashes(rest),
        _ => trimmed,
    }
}

/// Joins a repo-relative directory and a child name.
pub fn join_repo_path(dir: &str, name: &str) -> String {
    let dir = trim_slashes(dir);
    let name = trim_slashes(name);
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
