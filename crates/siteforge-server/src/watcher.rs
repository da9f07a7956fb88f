//! Source watching: debounced file events routed to the tasks that
//! consume them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use siteforge_pipeline::FileGroup;
use tokio::sync::mpsc;

/// Quiet period a path needs before its change is reported.
///
/// A burst of writes to one file yields a single event after the last one.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// A source change that should re-run a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Task to run
    pub task: &'static str,

    /// File that changed
    pub path: PathBuf,
}

/// Maps changed paths to task names.
#[derive(Debug, Clone)]
pub struct Bindings {
    groups: Vec<(FileGroup, &'static str)>,
}

impl Bindings {
    pub fn new(groups: Vec<(FileGroup, &'static str)>) -> Self {
        Self { groups }
    }

    /// Tasks whose patterns match `path`, without duplicates.
    pub fn route(&self, path: &Path) -> Vec<&'static str> {
        let mut tasks = Vec::new();
        for (group, task) in &self.groups {
            if group.matches(path) && !tasks.contains(task) {
                tasks.push(*task);
            }
        }
        tasks
    }

    /// One event per task triggered by a batch of changed paths, naming the
    /// first path that triggered it.
    pub fn events(&self, paths: impl IntoIterator<Item = PathBuf>) -> Vec<WatchEvent> {
        let mut events: Vec<WatchEvent> = Vec::new();
        for path in paths {
            for task in self.route(&path) {
                if events.iter().all(|e| e.task != task) {
                    events.push(WatchEvent {
                        task,
                        path: path.clone(),
                    });
                }
            }
        }
        events
    }
}

/// Watches a source tree and emits one [`WatchEvent`] per triggered task
/// once the changes have settled.
pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl FileWatcher {
    /// Watch `root` recursively.
    ///
    /// Returns the watcher, which stops watching when dropped, and the
    /// event channel.
    pub fn new(
        root: &Path,
        bindings: Bindings,
    ) -> Result<(Self, mpsc::Receiver<WatchEvent>), notify::Error> {
        let (tx, rx) = mpsc::channel(100);

        let mut debouncer = new_debouncer(DEBOUNCE_WINDOW, move |res: DebounceEventResult| {
            let changed = match res {
                Ok(changed) => changed,
                Err(e) => {
                    tracing::warn!("Watch error: {:?}", e);
                    return;
                }
            };

            let paths = changed
                .into_iter()
                .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                .map(|e| e.path);
            for event in bindings.events(paths) {
                tracing::debug!("{} changed, queueing '{}'", event.path.display(), event.task);
                if tx.blocking_send(event).is_err() {
                    return;
                }
            }
        })?;
        debouncer.watcher().watch(root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _debouncer: debouncer,
            },
            rx,
        ))
    }
}
