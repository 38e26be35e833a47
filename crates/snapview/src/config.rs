//! Store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Quiet window that must elapse after the last CSS watch event before the
/// style reconciliation fires.
pub const DEFAULT_CSS_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Glob patterns matching snapshot source files.
    pub snapshot_patterns: Vec<String>,
    /// Glob patterns matching global CSS fragments.
    pub css_patterns: Vec<String>,
    /// Whether `start()` should begin watching for file changes.
    pub watch: bool,
    pub css_debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_patterns: Vec::new(),
            css_patterns: Vec::new(),
            watch: false,
            css_debounce: DEFAULT_CSS_DEBOUNCE,
        }
    }
}

/// Partial configuration merged by `SnapshotStore::configure`. Unset fields
/// leave the current value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub snapshot_patterns: Option<Vec<String>>,
    pub css_patterns: Option<Vec<String>>,
    pub watch: Option<bool>,
    pub css_debounce_ms: Option<u64>,
}

impl Config {
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(snapshot_patterns) = patch.snapshot_patterns {
            self.snapshot_patterns = snapshot_patterns;
        }
        if let Some(css_patterns) = patch.css_patterns {
            self.css_patterns = css_patterns;
        }
        if let Some(watch) = patch.watch {
            self.watch = watch;
        }
        if let Some(ms) = patch.css_debounce_ms {
            self.css_debounce = Duration::from_millis(ms);
        }
    }
}
