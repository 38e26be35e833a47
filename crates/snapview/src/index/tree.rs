//! Folder tree construction.
//!
//! The tree is an arena of folder nodes keyed by normalized path, with
//! parent and child links stored as path strings. It is always rebuilt from
//! scratch from the full suite map, never patched incrementally, and dirty
//! flags are recomputed in one post-order pass afterwards.

use std::collections::HashMap;

use crate::error::{Result, SnapviewError};
use crate::types::{parent_folder_path, FilePath, Folder, FolderPath, SnapshotSuite,
    ROOT_FOLDER_PATH};

/// Builds the complete folder tree for the given suite map.
///
/// On error the caller is expected to keep its previous tree; this function
/// never mutates shared state.
pub(crate) fn build_folder_tree(
    suites: &HashMap<FilePath, SnapshotSuite>,
) -> Result<HashMap<FolderPath, Folder>> {
    let mut folders: HashMap<FolderPath, Folder> = HashMap::new();
    folders.insert(
        ROOT_FOLDER_PATH.to_string(),
        Folder::new(ROOT_FOLDER_PATH.to_string(), None),
    );

    // Sorted paths keep sibling ordering deterministic and mean each
    // folder's files arrive consecutively.
    let mut file_paths: Vec<&FilePath> = suites.keys().collect();
    file_paths.sort();

    for file_path in file_paths {
        let folder_path = parent_folder_path(file_path).ok_or_else(|| {
            SnapviewError::Tree(format!("suite path {file_path:?} has no containing folder"))
        })?;
        if !folders.contains_key(&folder_path) {
            create_folder_chain(&mut folders, &folder_path)?;
        }
        match folders.get_mut(&folder_path) {
            Some(folder) => folder.file_paths.push(file_path.clone()),
            None => {
                return Err(SnapviewError::Tree(format!(
                    "folder {folder_path:?} missing after creation"
                )))
            }
        }
    }

    recompute_dirty_flags(&mut folders, suites, ROOT_FOLDER_PATH);
    Ok(folders)
}

/// Recomputes every folder's dirty flags against the current suite map,
/// leaving the tree shape untouched.
pub(crate) fn recompute_dirty(
    folders: &mut HashMap<FolderPath, Folder>,
    suites: &HashMap<FilePath, SnapshotSuite>,
) {
    recompute_dirty_flags(folders, suites, ROOT_FOLDER_PATH);
}

/// Creates `folder_path` and any missing ancestors, linking each new folder
/// into its parent's child list.
///
/// The walk must terminate because every path is nested under the root,
/// which exists before any suite is processed; running out of ancestors is
/// an invariant violation and fatal for the rebuild.
fn create_folder_chain(
    folders: &mut HashMap<FolderPath, Folder>,
    folder_path: &str,
) -> Result<()> {
    let mut missing: Vec<FolderPath> = Vec::new();
    let mut current = folder_path.to_string();
    while !folders.contains_key(&current) {
        missing.push(current.clone());
        match parent_folder_path(&current) {
            Some(parent) => current = parent,
            None => {
                return Err(SnapviewError::Tree(format!(
                    "no ancestor found for folder {folder_path:?}"
                )))
            }
        }
    }

    // `current` is the nearest existing ancestor; create the chain top-down.
    for folder_path in missing.into_iter().rev() {
        match folders.get_mut(&current) {
            Some(parent) => parent.children_folder_paths.push(folder_path.clone()),
            None => {
                return Err(SnapviewError::Tree(format!(
                    "parent folder {current:?} missing during creation"
                )))
            }
        }
        folders.insert(
            folder_path.clone(),
            Folder::new(folder_path.clone(), Some(current.clone())),
        );
        current = folder_path;
    }
    Ok(())
}

/// Post-order traversal: children first, then this folder's flag arrays and
/// its own aggregate flag.
fn recompute_dirty_flags(
    folders: &mut HashMap<FolderPath, Folder>,
    suites: &HashMap<FilePath, SnapshotSuite>,
    folder_path: &str,
) -> bool {
    let (child_folders, child_files) = match folders.get(folder_path) {
        Some(folder) => (
            folder.children_folder_paths.clone(),
            folder.file_paths.clone(),
        ),
        None => return false,
    };

    let children_flags: Vec<bool> = child_folders
        .iter()
        .map(|child| recompute_dirty_flags(folders, suites, child))
        .collect();
    let suite_flags: Vec<bool> = child_files
        .iter()
        .map(|file_path| suites.get(file_path).is_some_and(|suite| suite.dirty))
        .collect();
    let dirty =
        children_flags.iter().any(|flag| *flag) || suite_flags.iter().any(|flag| *flag);

    if let Some(folder) = folders.get_mut(folder_path) {
        folder.children_folder_dirty_flags = children_flags;
        folder.suite_dirty_flags = suite_flags;
        folder.dirty = dirty;
    }
    dirty
}
