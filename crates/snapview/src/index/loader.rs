//! Suite loading.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SnapviewError};
use crate::snap;
use crate::types::{file_path_key, parent_folder_path, FilePath, Snapshot, SnapshotSuite,
    ROOT_FOLDER_PATH};

use super::css;

/// Reads and parses one snapshot source file into a suite.
///
/// The returned suite carries clean flags throughout; reconciling it against
/// a previously indexed version is the caller's job. A file that cannot be
/// parsed fails with a `Parse` error and leaves no side effects.
pub(crate) async fn load_suite(
    source_path: &Path,
    common_css: &[String],
) -> Result<(FilePath, SnapshotSuite)> {
    tracing::debug!("loading snapshot suite {}", source_path.display());
    let source = tokio::fs::read_to_string(source_path).await?;
    let raw_entries =
        snap::parse_snapshot_source(&source).map_err(|error| SnapviewError::Parse {
            path: source_path.to_path_buf(),
            message: error.to_string(),
        })?;

    let suite_css = css::suite_css(source_path).await;
    let styles = css::compose_css(common_css, suite_css.as_deref());

    let mut snapshots = BTreeMap::new();
    for (id, raw) in raw_entries {
        let (snap_text, html) = snap::split_preview(&raw);
        snapshots.insert(
            id.clone(),
            Snapshot {
                id,
                snap: snap_text,
                html,
                css: styles.clone(),
                dirty: false,
                deleted: false,
                baseline: None,
            },
        );
    }
    tracing::debug!("found {} snapshots", snapshots.len());

    let file_path = file_path_key(source_path);
    let folder_path =
        parent_folder_path(&file_path).unwrap_or_else(|| ROOT_FOLDER_PATH.to_string());
    let suite = SnapshotSuite {
        folder_path,
        dirty: false,
        deleted: false,
        snapshots,
        source_path: source_path.to_path_buf(),
    };
    Ok((file_path, suite))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::HTML_PREVIEW_SEPARATOR;
    use tempfile::TempDir;

    fn write_snap(path: &Path, entries: &[(&str, &str)]) {
        let mut out = String::from("// Jest Snapshot v1, https://goo.gl/fbAQLP\n\n");
        for (id, value) in entries {
            out.push_str(&format!("exports[`{id}`] = `{value}`;\n\n"));
        }
        std::fs::write(path, out).unwrap();
    }

    #[tokio::test]
    async fn loads_suite_with_preview_and_css() {
        let temp = TempDir::new().unwrap();
        let source_path = temp.path().join("app.snap");
        let value = format!("<App />\n{HTML_PREVIEW_SEPARATOR}\n<div>app</div>");
        write_snap(&source_path, &[("App 1", &value), ("Bare 1", "text only")]);
        std::fs::write(temp.path().join("app.css"), "suite-css").unwrap();

        let common = vec!["common-css".to_string()];
        let (file_path, suite) = load_suite(&source_path, &common).await.unwrap();

        assert_eq!(file_path, file_path_key(&source_path));
        assert_eq!(suite.folder_path, parent_folder_path(&file_path).unwrap());
        assert!(!suite.dirty);
        assert!(!suite.deleted);

        let app = &suite.snapshots["App 1"];
        assert_eq!(app.snap, "<App />\n");
        assert_eq!(app.html.as_deref(), Some("\n<div>app</div>"));
        assert_eq!(
            app.css,
            vec!["common-css".to_string(), "suite-css".to_string()]
        );

        let bare = &suite.snapshots["Bare 1"];
        assert_eq!(bare.snap, "text only");
        assert_eq!(bare.html, None);
    }

    #[tokio::test]
    async fn snapshots_are_listed_in_lexicographic_id_order() {
        let temp = TempDir::new().unwrap();
        let source_path = temp.path().join("order.snap");
        write_snap(&source_path, &[("b 1", "x"), ("a 1", "y"), ("a 2", "z")]);

        let (_, suite) = load_suite(&source_path, &[]).await.unwrap();
        let ids: Vec<&str> = suite.snapshots.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a 1", "a 2", "b 1"]);
    }

    #[tokio::test]
    async fn malformed_source_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let source_path = temp.path().join("bad.snap");
        std::fs::write(&source_path, "module.exports = () => {};").unwrap();

        let error = load_suite(&source_path, &[]).await.unwrap_err();
        assert!(matches!(error, SnapviewError::Parse { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        let error = load_suite(&temp.path().join("nope.snap"), &[])
            .await
            .unwrap_err();
        assert!(matches!(error, SnapviewError::Io(_)));
    }
}
