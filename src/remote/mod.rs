//! ModelScope REST API schema and mapping.
//!
//! This module owns the wire-level concerns (response envelope, success
//! test, entry mapping). Request sequencing lives in `crate::browser`.

pub mod transport;

use serde::{Deserialize, Serialize};

use crate::object::{join_repo_path, ExposedObject};

/// Type tag the API uses for directories.
pub const TREE_TYPE: &str = "tree";

/// A file or directory returned by the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub size: i64,
    pub committed_date: i64,
}

impl RemoteEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == TREE_TYPE
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FileListData {
    pub files: Vec<RemoteEntry>,
}

/// Envelope shared by the file and tree listing endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FileListResponse {
    pub data: Option<FileListData>,
    pub success: bool,
    pub code: i64,
    pub message: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
}

impl FileListResponse {
    /// Decodes an envelope from raw response bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The API signals success either way; older endpoints only set `Code`.
    pub fn is_success(&self) -> bool {
        self.success || self.code == 200
    }

    pub fn entries(&self) -> &[RemoteEntry] {
        self.data.as_ref().map(|data| data.files.as_slice()).unwrap_or_default()
    }
}

/// Maps entries whose `Path` is already the full repo path (model repos).
pub fn entries_to_objects(entries: &[RemoteEntry]) -> Vec<ExposedObject> {
    entries
        .iter()
        .map(|entry| to_object(entry, entry.path.clone()))
        .collect()
}

/// Maps entries by joining `dir` with each entry name (dataset trees).
pub fn entries_to_objects_under(dir: &str, entries: &[RemoteEntry]) -> Vec<ExposedObject> {
    entries
        .iter()
        .map(|entry| to_object(entry, join_repo_path(dir, &entry.name)))
        .collect()
}

fn to_object(entry: &RemoteEntry, path: String) -> ExposedObject {
    let is_dir = entry.is_dir();
    ExposedObject {
        id: path.clone(),
        name: entry.name.clone(),
        path,
        size: entry.size,
        modified: if is_dir { 0 } else { entry.committed_date },
        is_dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "Code": 200,
        "Data": {"Files": [
            {"Name": "README.md", "Path": "README.md", "Type": "blob", "Size": 120, "CommittedDate": 1700000000},
            {"Name": "weights", "Path": "weights", "Type": "tree", "Size": 0, "CommittedDate": 1700000001}
        ]},
        "Message": "success",
        "RequestId": "req-1",
        "Success": false
    }"#;

    #[test]
    fn code_200_counts_as_success() {
        let response = FileListResponse::from_slice(LISTING.as_bytes()).expect("decode");
        assert!(response.is_success());
        assert_eq!(response.request_id, "req-1");
        assert_eq!(response.entries().len(), 2);
    }

    #[test]
    fn success_flag_alone_counts_as_success() {
        let response =
            FileListResponse::from_slice(br#"{"Success": true, "Code": 0}"#).expect("decode");
        assert!(response.is_success());
        assert!(response.entries().is_empty());
    }

    #[test]
    fn failure_envelope_is_not_success() {
        let response = FileListResponse::from_slice(
            br#"{"Success": false, "Code": 10010205001, "Message": "not found", "Data": null}"#,
        )
        .expect("decode");
        assert!(!response.is_success());
        assert_eq!(response.message, "not found");
    }

    #[test]
    fn model_entries_keep_api_paths() {
        let response = FileListResponse::from_slice(LISTING.as_bytes()).expect("decode");
        let objects = entries_to_objects(response.entries());

        assert_eq!(objects[0].path, "README.md");
        assert_eq!(objects[0].size, 120);
        assert_eq!(objects[0].modified, 1_700_000_000);
        assert!(!objects[0].is_dir);

        assert!(objects[1].is_dir);
        assert_eq!(objects[1].modified, 0);
    }

    #[test]
    fn dataset_entries_are_joined_under_current_dir() {
        let entries = vec![RemoteEntry {
            name: "c.txt".into(),
            path: "ignored".into(),
            kind: "blob".into(),
            size: 3,
            committed_date: 5,
        }];

        assert_eq!(entries_to_objects_under("a/b", &entries)[0].path, "a/b/c.txt");
        assert_eq!(entries_to_objects_under("", &entries)[0].path, "c.txt");
        assert_eq!(entries_to_objects_under("", &entries)[0].id, "c.txt");
    }
}
