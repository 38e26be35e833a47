//! Index data model: snapshots, suites, folders, and their path keys.
//!
//! Suites are keyed by a normalized, forward-slash path string rooted under
//! the virtual root `-`. Keys are OS-independent and every key is nested
//! under the root by construction, so walking up a folder chain always
//! terminates. Field names serialize in camelCase because the index is
//! shipped as-is to browser clients.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Normalized path key of a suite's backing source file.
pub type FilePath = String;

/// Normalized path key of a folder node.
pub type FolderPath = String;

/// Virtual root under which every indexed path is nested.
pub const ROOT_FOLDER_PATH: &str = "-";

/// A retained prior state of a snapshot, used as the diff reference until
/// explicitly accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub snap: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// One recorded test output within a suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    /// Canonical textual representation.
    pub snap: String,
    /// Rendered HTML preview, absent for non-renderable snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Ordered CSS fragments: global ones first, then the suite override.
    pub css: Vec<String>,
    pub dirty: bool,
    pub deleted: bool,
    /// Present only while the snapshot is dirty and not yet accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
}

/// The indexed representation of one snapshot source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSuite {
    pub folder_path: FolderPath,
    /// True if any contained snapshot is dirty.
    pub dirty: bool,
    /// True if the backing source file was removed from disk. The suite is
    /// retained in the index until a later successful load replaces it.
    pub deleted: bool,
    /// Snapshots keyed by id; the map keeps listings in lexicographic id
    /// order across reloads.
    pub snapshots: BTreeMap<String, Snapshot>,
    /// On-disk location of the backing source file.
    #[serde(skip)]
    pub source_path: PathBuf,
}

/// A node in the hierarchical index mirroring the source directory tree.
///
/// `suite_dirty_flags` and `children_folder_dirty_flags` run parallel to
/// `file_paths` and `children_folder_paths` respectively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub folder_path: FolderPath,
    pub parent_folder_path: Option<FolderPath>,
    pub dirty: bool,
    pub file_paths: Vec<FilePath>,
    pub suite_dirty_flags: Vec<bool>,
    pub children_folder_paths: Vec<FolderPath>,
    pub children_folder_dirty_flags: Vec<bool>,
}

impl Folder {
    pub fn new(folder_path: FolderPath, parent_folder_path: Option<FolderPath>) -> Self {
        Self {
            folder_path,
            parent_folder_path,
            dirty: false,
            file_paths: Vec::new(),
            suite_dirty_flags: Vec::new(),
            children_folder_paths: Vec::new(),
            children_folder_dirty_flags: Vec::new(),
        }
    }
}

/// Converts an on-disk path into its index key: forward-slash separated and
/// prefixed with the virtual root.
pub fn file_path_key(path: &Path) -> FilePath {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }
    format!("{ROOT_FOLDER_PATH}/{}", parts.join("/"))
}

/// Containing folder of a path key; `None` only at the virtual root.
pub fn parent_folder_path(path: &str) -> Option<FolderPath> {
    if path == ROOT_FOLDER_PATH {
        return None;
    }
    match path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => Some(parent.to_string()),
        _ => Some(ROOT_FOLDER_PATH.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_key_is_rooted_and_slash_separated() {
        assert_eq!(
            file_path_key(Path::new("fixtures/a.snap")),
            "-/fixtures/a.snap"
        );
        assert_eq!(
            file_path_key(Path::new("/tmp/suites/a.snap")),
            "-/tmp/suites/a.snap"
        );
        assert_eq!(file_path_key(Path::new("./a.snap")), "-/a.snap");
    }

    #[test]
    fn parent_chain_terminates_at_root() {
        let key = file_path_key(Path::new("x/y/f.snap"));
        let folder = parent_folder_path(&key).unwrap();
        assert_eq!(folder, "-/x/y");
        let parent = parent_folder_path(&folder).unwrap();
        assert_eq!(parent, "-/x");
        let grandparent = parent_folder_path(&parent).unwrap();
        assert_eq!(grandparent, ROOT_FOLDER_PATH);
        assert_eq!(parent_folder_path(ROOT_FOLDER_PATH), None);
    }

    #[test]
    fn wire_format_is_camel_case() {
        let folder = Folder::new("-/x".to_string(), Some(ROOT_FOLDER_PATH.to_string()));
        let value = serde_json::to_value(&folder).unwrap();
        assert_eq!(value["folderPath"], "-/x");
        assert_eq!(value["parentFolderPath"], ROOT_FOLDER_PATH);
        assert!(value["filePaths"].as_array().unwrap().is_empty());
        assert!(value["childrenFolderPaths"].as_array().unwrap().is_empty());
        assert_eq!(value["dirty"], false);
    }

    #[test]
    fn clean_snapshot_serializes_without_baseline() {
        let snapshot = Snapshot {
            id: "a 1".to_string(),
            snap: "text".to_string(),
            html: None,
            css: vec![],
            dirty: false,
            deleted: false,
            baseline: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("baseline").is_none());
        assert!(value.get("html").is_none());
    }
}
