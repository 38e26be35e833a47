//! Filesystem watching.
//!
//! The notify watcher callback classifies event paths against the
//! configured pattern sets and sends them over a channel; a spawned
//! dispatcher task is the sole consumer and drives reconciliation, so watch
//! handling never races a rebuild. CSS events are coalesced behind one
//! resettable deadline; snapshot events are handled individually in arrival
//! order.

use std::path::{Component, Path, PathBuf};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{Result, SnapviewError};

use super::store::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotEventKind {
    Created,
    Changed,
    Removed,
}

/// An event sent from the watcher callback to the dispatcher task.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum WatchEvent {
    Snapshot(SnapshotEventKind, PathBuf),
    Css(PathBuf),
}

/// Keeps the OS watcher and the dispatcher task alive.
pub(crate) struct WatchHandle {
    _watcher: RecommendedWatcher,
    dispatcher: JoinHandle<()>,
}

impl WatchHandle {
    pub(crate) fn stop(self) {
        self.dispatcher.abort();
    }
}

/// Starts watching the store's configured pattern sets and spawns the
/// dispatcher task. Watch roots are the literal prefixes of the patterns,
/// reduced to a minimal ancestor cover.
pub(crate) fn spawn(store: SnapshotStore) -> Result<WatchHandle> {
    let config = store.config();
    let classifier = EventClassifier {
        snapshot_patterns: compile_patterns(&config.snapshot_patterns)?,
        css_patterns: compile_patterns(&config.css_patterns)?,
        cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut watcher = recommended_watcher(move |event_result: notify::Result<Event>| {
        match event_result {
            Ok(event) => classifier.dispatch(event, &event_tx),
            Err(error) => tracing::warn!("watch error: {error}"),
        }
    })
    .map_err(|error| {
        SnapviewError::Watch(format!("failed to create filesystem watcher: {error}"))
    })?;

    let roots = watch_roots(
        config
            .snapshot_patterns
            .iter()
            .chain(config.css_patterns.iter()),
    );
    for root in roots {
        if let Err(error) = watcher.watch(&root, RecursiveMode::Recursive) {
            tracing::warn!("failed to watch {}: {error}", root.display());
        }
    }

    let dispatcher = tokio::spawn(dispatch_events(store, event_rx, config.css_debounce));
    Ok(WatchHandle {
        _watcher: watcher,
        dispatcher,
    })
}

/// The single consumer of watch events.
///
/// A CSS event arms (or re-arms) the debounce deadline; only a full quiet
/// window triggers the style reconciliation, so a burst collapses into one
/// cycle. Snapshot events reconcile immediately, one at a time, in receipt
/// order.
pub(crate) async fn dispatch_events(
    store: SnapshotStore,
    mut event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    css_debounce: std::time::Duration,
) {
    let mut css_deadline: Option<Instant> = None;
    loop {
        let deadline = css_deadline.unwrap_or_else(Instant::now);
        tokio::select! {
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    None => break,
                    Some(WatchEvent::Css(path)) => {
                        tracing::debug!("CSS watch fired: {}", path.display());
                        css_deadline = Some(Instant::now() + css_debounce);
                    }
                    Some(WatchEvent::Snapshot(kind, path)) => {
                        tracing::debug!("snapshot watch fired ({kind:?}): {}", path.display());
                        match kind {
                            SnapshotEventKind::Created | SnapshotEventKind::Changed => {
                                store.reload_suite(&path).await;
                            }
                            SnapshotEventKind::Removed => {
                                store.mark_suite_removed(&path).await;
                            }
                        }
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline), if css_deadline.is_some() => {
                css_deadline = None;
                store.refresh_css().await;
            }
        }
    }
}

struct EventClassifier {
    snapshot_patterns: Vec<glob::Pattern>,
    css_patterns: Vec<glob::Pattern>,
    cwd: PathBuf,
}

impl EventClassifier {
    fn dispatch(&self, event: Event, event_tx: &mpsc::UnboundedSender<WatchEvent>) {
        let kind = match event.kind {
            EventKind::Create(_) => SnapshotEventKind::Created,
            EventKind::Modify(_) => SnapshotEventKind::Changed,
            EventKind::Remove(_) => SnapshotEventKind::Removed,
            EventKind::Access(_) => return,
            EventKind::Any | EventKind::Other => SnapshotEventKind::Changed,
        };
        for path in event.paths {
            if let Some(watch_event) = self.classify(kind, &path) {
                let _ = event_tx.send(watch_event);
            }
        }
    }

    /// Matches an event path against the configured pattern sets, dotfiles
    /// excluded. Paths are tried relative to the watch-time working
    /// directory first so relative patterns line up with the keys produced
    /// during load.
    fn classify(&self, kind: SnapshotEventKind, path: &Path) -> Option<WatchEvent> {
        if is_dot_path(path) {
            return None;
        }
        let relative = path.strip_prefix(&self.cwd).ok();
        for candidate in relative.into_iter().chain(std::iter::once(path)) {
            if matches_any(&self.snapshot_patterns, candidate) {
                return Some(WatchEvent::Snapshot(kind, candidate.to_path_buf()));
            }
            if matches_any(&self.css_patterns, candidate) {
                return Some(WatchEvent::Css(candidate.to_path_buf()));
            }
        }
        None
    }
}

fn matches_any(patterns: &[glob::Pattern], path: &Path) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            glob::Pattern::new(pattern).map_err(|error| SnapviewError::Pattern {
                pattern: pattern.clone(),
                message: error.to_string(),
            })
        })
        .collect()
}

/// Any path with a dot-prefixed component is ignored.
fn is_dot_path(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// The longest literal path prefix of a glob pattern. A pattern with no
/// glob metacharacters names a single file, so its directory is watched.
fn pattern_root(pattern: &str) -> PathBuf {
    let mut root = PathBuf::new();
    let mut truncated = false;
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text
            .chars()
            .any(|c| matches!(c, '*' | '?' | '[' | '{'))
        {
            truncated = true;
            break;
        }
        root.push(component.as_os_str());
    }
    if !truncated {
        root.pop();
    }
    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root
    }
}

/// Minimal ancestor cover of the pattern roots: a root already covered by a
/// watched ancestor is skipped.
fn watch_roots<'a>(patterns: impl Iterator<Item = &'a String>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = patterns.map(|pattern| pattern_root(pattern)).collect();
    roots.sort();
    roots.dedup();

    let mut cover: Vec<PathBuf> = Vec::new();
    for root in roots {
        if cover.iter().any(|kept| root.starts_with(kept)) {
            continue;
        }
        cover.push(root);
    }
    cover
}
