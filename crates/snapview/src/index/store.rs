//! The snapshot index store.
//!
//! Owns the suite and folder maps and funnels every mutation through one
//! reconciliation pipeline, serialized behind a single async gate so suite
//! loads, tree rebuilds, and baseline acceptance never interleave. Lookups
//! are served as snapshot copies from a read lock and never observe a
//! half-finished rebuild.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::bus::{Bus, IndexEvent};
use crate::config::{Config, ConfigPatch};
use crate::error::Result;
use crate::types::{file_path_key, FilePath, Folder, FolderPath, SnapshotSuite};

use super::css;
use super::diff;
use super::loader;
use super::tree;
use super::watcher::{self, WatchHandle};

const BUS_CAPACITY: usize = 16;

/// Handle to the shared index. Cheap to clone; all clones view the same
/// state.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: RwLock<Config>,
    common_css: RwLock<Vec<String>>,
    suites: RwLock<HashMap<FilePath, SnapshotSuite>>,
    folders: RwLock<HashMap<FolderPath, Folder>>,
    bus: Bus,
    /// Serializes every mutating pipeline. Lookups never take it.
    reconcile: tokio::sync::Mutex<()>,
    watch: Mutex<Option<WatchHandle>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config: RwLock::new(Config::default()),
                common_css: RwLock::new(Vec::new()),
                suites: RwLock::new(HashMap::new()),
                folders: RwLock::new(HashMap::new()),
                bus: Bus::new(BUS_CAPACITY),
                reconcile: tokio::sync::Mutex::new(()),
                watch: Mutex::new(None),
            }),
        }
    }

    /// Merges options into the current configuration. The first call
    /// establishes them.
    pub fn configure(&self, patch: ConfigPatch) {
        self.inner.config.write().apply(patch);
    }

    pub fn config(&self) -> Config {
        self.inner.config.read().clone()
    }

    /// Subscribes to reconciliation notifications.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<IndexEvent> {
        self.inner.bus.subscribe()
    }

    /// Full refresh: aggregate CSS, load every suite matching the configured
    /// patterns, reconcile each against whatever was previously indexed,
    /// rebuild the folder tree, optionally begin watching, and broadcast
    /// once.
    ///
    /// Per-suite failures are isolated: one bad file leaves that path stale
    /// and the rest of the refresh proceeds. A tree construction failure
    /// aborts the cycle, keeping the previous folder map.
    pub async fn start(&self) -> Result<()> {
        let _guard = self.inner.reconcile.lock().await;
        let config = self.config();
        tracing::info!("refreshing snapshot index");

        let common = css::load_common_css(&config.css_patterns).await;
        *self.inner.common_css.write() = common.clone();

        let source_paths = super::resolve_patterns(&config.snapshot_patterns);
        tracing::debug!("found {} snapshot files", source_paths.len());
        for source_path in &source_paths {
            if let Err(error) = self.integrate_suite(source_path, &common).await {
                tracing::warn!(
                    "skipping snapshot suite {}: {error}",
                    source_path.display()
                );
            }
        }

        self.rebuild_folder_tree()?;

        if config.watch {
            self.watch_start()?;
        }
        self.inner.bus.publish(IndexEvent::Refresh);
        Ok(())
    }

    /// Pure lookup; absent paths are `None`, never an error.
    pub fn get_folder(&self, folder_path: &str) -> Option<Folder> {
        self.inner.folders.read().get(folder_path).cloned()
    }

    /// Pure lookup; absent paths are `None`, never an error.
    pub fn get_suite(&self, file_path: &str) -> Option<SnapshotSuite> {
        self.inner.suites.read().get(file_path).cloned()
    }

    /// Accepts the current content of one snapshot as its new baseline,
    /// clearing its dirty state and refreshing folder dirty flags.
    ///
    /// Idempotent: a missing suite, snapshot, or baseline is a no-op.
    pub async fn accept_baseline(&self, file_path: &str, id: &str) {
        let _guard = self.inner.reconcile.lock().await;
        {
            let mut suites = self.inner.suites.write();
            let Some(suite) = suites.get_mut(file_path) else {
                return;
            };
            let Some(snapshot) = suite.snapshots.get_mut(id) else {
                return;
            };
            if snapshot.baseline.is_none() {
                return;
            }
            snapshot.baseline = None;
            snapshot.dirty = false;
            suite.dirty = suite.snapshots.values().any(|snapshot| snapshot.dirty);
            tracing::info!("accepted baseline for {id:?} in {file_path}");
        }
        let suites = self.inner.suites.read();
        let mut folders = self.inner.folders.write();
        tree::recompute_dirty(&mut folders, &suites);
    }

    /// Begins watching the configured pattern sets. Idempotent: a second
    /// call while already watching is a no-op. Must run inside a tokio
    /// runtime.
    pub fn watch_start(&self) -> Result<()> {
        let mut watch = self.inner.watch.lock();
        if watch.is_some() {
            return Ok(());
        }
        *watch = Some(watcher::spawn(self.clone())?);
        tracing::info!("watching snapshot and CSS files");
        Ok(())
    }

    /// Stops watching and releases the dispatcher task. The index itself
    /// stays queryable.
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.watch.lock().take() {
            handle.stop();
            tracing::info!("stopped file watcher");
        }
    }

    // -------------------------------------------------------------------------
    // Reconciliation internals (also driven by the watch dispatcher)
    // -------------------------------------------------------------------------

    /// Loads one suite and reconciles it into the map. IO and parsing run
    /// before the write lock is taken.
    async fn integrate_suite(&self, source_path: &Path, common_css: &[String]) -> Result<()> {
        let (file_path, mut suite) = loader::load_suite(source_path, common_css).await?;
        let mut suites = self.inner.suites.write();
        diff::reconcile(&mut suite, suites.get(&file_path));
        suites.insert(file_path, suite);
        Ok(())
    }

    /// Rebuilds the folder tree from the current suite map. On failure the
    /// previous tree is left intact and the error is surfaced.
    fn rebuild_folder_tree(&self) -> Result<()> {
        let suites = self.inner.suites.read();
        let folders = tree::build_folder_tree(&suites)?;
        drop(suites);
        *self.inner.folders.write() = folders;
        Ok(())
    }

    /// Reloads one suite after a watch add/change, rebuilds the tree, and
    /// broadcasts. A parse failure keeps the previously indexed value; a
    /// tree failure aborts the cycle without broadcasting.
    pub(crate) async fn reload_suite(&self, source_path: &Path) {
        let _guard = self.inner.reconcile.lock().await;
        let common = self.inner.common_css.read().clone();
        match self.integrate_suite(source_path, &common).await {
            Ok(()) => {
                if let Err(error) = self.rebuild_folder_tree() {
                    tracing::warn!("folder tree rebuild failed: {error}");
                    return;
                }
            }
            Err(error) => {
                tracing::warn!(
                    "failed to reload snapshot suite {}: {error}",
                    source_path.display()
                );
            }
        }
        self.inner.bus.publish(IndexEvent::Refresh);
    }

    /// Marks a removed suite deleted without reparsing it, rebuilds the
    /// tree, and broadcasts. The suite stays in the index so the removal
    /// remains visible until a later load at the same path replaces it.
    pub(crate) async fn mark_suite_removed(&self, source_path: &Path) {
        let _guard = self.inner.reconcile.lock().await;
        let file_path = file_path_key(source_path);
        {
            let mut suites = self.inner.suites.write();
            let Some(suite) = suites.get_mut(&file_path) else {
                return;
            };
            tracing::info!("snapshot suite removed: {file_path}");
            suite.deleted = true;
            suite.dirty = true;
        }
        if let Err(error) = self.rebuild_folder_tree() {
            tracing::warn!("folder tree rebuild failed: {error}");
            return;
        }
        self.inner.bus.publish(IndexEvent::Refresh);
    }

    /// Re-resolves all CSS and reapplies it to every indexed suite without
    /// touching snapshot content, dirty flags, or baselines, then
    /// broadcasts.
    pub(crate) async fn refresh_css(&self) {
        let _guard = self.inner.reconcile.lock().await;
        let config = self.config();
        tracing::debug!("reapplying CSS across all suites");
        let common = css::load_common_css(&config.css_patterns).await;
        *self.inner.common_css.write() = common.clone();

        let sources: Vec<(FilePath, PathBuf)> = self
            .inner
            .suites
            .read()
            .iter()
            .map(|(file_path, suite)| (file_path.clone(), suite.source_path.clone()))
            .collect();
        let mut per_suite: HashMap<FilePath, Option<String>> = HashMap::new();
        for (file_path, source_path) in sources {
            per_suite.insert(file_path, css::suite_css(&source_path).await);
        }

        {
            let mut suites = self.inner.suites.write();
            for (file_path, suite) in suites.iter_mut() {
                let fragment = per_suite.get(file_path).and_then(|css| css.as_deref());
                let styles = css::compose_css(&common, fragment);
                for snapshot in suite.snapshots.values_mut() {
                    snapshot.css = styles.clone();
                }
            }
        }
        self.inner.bus.publish(IndexEvent::Refresh);
    }
}
