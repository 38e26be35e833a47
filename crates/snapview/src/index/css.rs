//! CSS aggregation.
//!
//! Every snapshot carries the global CSS fragments (resolved from the
//! configured patterns, in resolution order) followed by an optional
//! suite-specific fragment: a sibling file named after the source file with
//! a `.css` extension. CSS can be recomputed and reapplied without
//! reloading any suite.

use std::path::{Path, PathBuf};

/// Resolves the global CSS pattern set. Unreadable fragments are logged and
/// treated as absent.
pub(crate) async fn load_common_css(patterns: &[String]) -> Vec<String> {
    let mut fragments = Vec::new();
    for css_path in super::resolve_patterns(patterns) {
        match tokio::fs::read_to_string(&css_path).await {
            Ok(contents) => fragments.push(contents),
            Err(error) => {
                tracing::warn!("failed to read CSS fragment {}: {error}", css_path.display());
            }
        }
    }
    fragments
}

/// Reads the suite-specific CSS fragment for a source file. A missing file
/// is simply "no fragment"; any other read failure is logged and treated
/// the same.
pub(crate) async fn suite_css(source_path: &Path) -> Option<String> {
    let css_path = suite_css_path(source_path);
    match tokio::fs::read_to_string(&css_path).await {
        Ok(contents) => Some(contents),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
        Err(error) => {
            tracing::warn!("failed to read suite CSS {}: {error}", css_path.display());
            None
        }
    }
}

/// Sibling CSS file for a suite source: same base name, `.css` extension.
pub(crate) fn suite_css_path(source_path: &Path) -> PathBuf {
    source_path.with_extension("css")
}

/// Ordered style list for a suite.
pub(crate) fn compose_css(common: &[String], suite: Option<&str>) -> Vec<String> {
    let mut css = common.to_vec();
    if let Some(fragment) = suite {
        css.push(fragment.to_string());
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn suite_css_path_replaces_only_the_last_extension() {
        assert_eq!(
            suite_css_path(Path::new("x/app.test.js.snap")),
            Path::new("x/app.test.js.css")
        );
    }

    #[test]
    fn compose_keeps_global_fragments_first() {
        let common = vec!["g1".to_string(), "g2".to_string()];
        assert_eq!(
            compose_css(&common, Some("suite")),
            vec!["g1".to_string(), "g2".to_string(), "suite".to_string()]
        );
        assert_eq!(compose_css(&common, None), common);
    }

    #[tokio::test]
    async fn missing_suite_css_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.snap");
        assert_eq!(suite_css(&source).await, None);

        std::fs::write(temp.path().join("a.css"), ".x { color: red }").unwrap();
        assert_eq!(
            suite_css(&source).await.as_deref(),
            Some(".x { color: red }")
        );
    }

    #[tokio::test]
    async fn common_css_follows_resolution_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.css"), "a").unwrap();
        std::fs::write(temp.path().join("b.css"), "b").unwrap();

        let fragments = load_common_css(&[format!("{}/*.css", temp.path().display())]).await;
        assert_eq!(fragments, vec!["a".to_string(), "b".to_string()]);
    }
}
