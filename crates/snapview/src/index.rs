//! Snapshot index: loading, baseline diffing, folder tree, watching.
//!
//! ## Module Structure
//!
//! - `css` - CSS aggregation (global fragments + per-suite overrides)
//! - `diff` - Baseline reconciliation between loads
//! - `loader` - Suite loading from snapshot source files
//! - `store` - Main API (SnapshotStore)
//! - `tree` - Folder tree construction and dirty propagation
//! - `watcher` - notify integration and the event dispatcher

mod css;
mod diff;
mod loader;
mod store;
mod tree;
mod watcher;

use std::collections::HashSet;
use std::path::PathBuf;

pub use store::SnapshotStore;

/// Resolves glob pattern sets into matching file paths, keeping pattern
/// order and dropping duplicates across overlapping patterns. Bad patterns
/// and unreadable matches are logged and skipped.
pub(crate) fn resolve_patterns(patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    for pattern in patterns {
        let entries = match glob::glob(pattern) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!("invalid glob pattern {pattern:?}: {error}");
                continue;
            }
        };
        for entry in entries {
            match entry {
                Ok(path) => {
                    if path.is_file() && seen.insert(path.clone()) {
                        paths.push(path);
                    }
                }
                Err(error) => {
                    tracing::warn!("failed to resolve an entry of {pattern:?}: {error}");
                }
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolves_in_pattern_order_without_duplicates() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.snap"), "").unwrap();
        std::fs::write(temp.path().join("b.snap"), "").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("sub/c.snap"), "").unwrap();

        let base = temp.path().display();
        let paths = resolve_patterns(&[
            format!("{base}/*.snap"),
            format!("{base}/**/*.snap"),
        ]);

        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("a.snap"));
        assert!(paths[1].ends_with("b.snap"));
    }

    #[test]
    fn bad_pattern_is_skipped() {
        assert!(resolve_patterns(&["[".to_string()]).is_empty());
    }
}
