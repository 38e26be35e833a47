//! Snapshot suite indexing and reconciliation engine.
//!
//! This crate ingests generated test-snapshot files scattered across a
//! directory tree and maintains an in-memory hierarchical index of them:
//! - Static parsing of snapshot source files into suites of named entries
//! - Baseline-anchored dirty tracking with explicit user acceptance
//! - Folder tree construction with aggregate dirty flags
//! - CSS aggregation (global fragments plus per-suite overrides)
//! - Debounced filesystem watching with change broadcasts
//!
//! The HTTP layer, UI, and CLI live outside this crate; they query the index
//! through [`SnapshotStore`] lookups and re-fetch on every [`IndexEvent`].

pub mod bus;
pub mod config;
pub mod error;
pub mod index;
pub mod snap;
pub mod types;

// Re-export main types
pub use bus::{Bus, IndexEvent};
pub use config::{Config, ConfigPatch};
pub use error::{Result, SnapviewError};
pub use index::SnapshotStore;
pub use snap::HTML_PREVIEW_SEPARATOR;
pub use types::{Baseline, Folder, Snapshot, SnapshotSuite, ROOT_FOLDER_PATH};
