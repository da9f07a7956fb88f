//! Watch mode: build once, serve the output, rebuild on change.

use std::path::{Path, PathBuf};

use siteforge_pipeline::{Runner, Step, TaskReport};
use tokio::sync::mpsc;

use crate::reload::{ReloadHub, ReloadMessage};
use crate::server::{DevServer, DevServerConfig, ServerError};
use crate::watcher::{Bindings, FileWatcher, WatchEvent};

/// Task whose output browsers can pick up without a page reload.
const STYLES_TASK: &str = "styles";

/// A running build-watch-serve loop.
pub struct WatchSession {
    runner: Runner,
    plan: Step,
    source: PathBuf,
    bindings: Bindings,
    server: DevServerConfig,
}

impl WatchSession {
    pub fn new(
        runner: Runner,
        plan: Step,
        source: impl Into<PathBuf>,
        bindings: Bindings,
        server: DevServerConfig,
    ) -> Self {
        Self {
            runner,
            plan,
            source: source.into(),
            bindings,
            server,
        }
    }

    /// Run the initial build, then watch and serve until interrupted.
    ///
    /// Build failures are logged and never end the session.
    pub async fn run(self) -> Result<(), ServerError> {
        let hub = ReloadHub::new();
        let runner = notifying(self.runner, hub.clone(), self.server.root.clone());

        match runner.run(&self.plan).await {
            Ok(report) => tracing::info!(
                "Built {} files in {}ms",
                report.files_written(),
                report.duration_ms
            ),
            Err(e) => tracing::error!("Initial build failed: {}", e),
        }

        std::fs::create_dir_all(&self.source)
            .map_err(|e| ServerError::WatchError(format!("{}: {}", self.source.display(), e)))?;
        let root = self
            .source
            .canonicalize()
            .map_err(|e| ServerError::WatchError(format!("{}: {}", self.source.display(), e)))?;
        let (watcher, rx) = FileWatcher::new(&root, self.bindings)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;
        tracing::info!("Watching {}", self.source.display());

        let events = tokio::spawn(rebuild_loop(runner, rx));
        let served = DevServer::new(self.server, hub).start().await;

        events.abort();
        drop(watcher);
        served
    }
}

/// Attach a listener that tells browsers about every completed task.
pub fn notifying(runner: Runner, hub: ReloadHub, output: PathBuf) -> Runner {
    runner.with_listener(move |report| hub.send(message_for(report, &output)))
}

/// Run the task for each event until the channel closes.
pub async fn rebuild_loop(runner: Runner, mut events: mpsc::Receiver<WatchEvent>) {
    while let Some(event) = events.recv().await {
        tracing::info!("{} changed", event.path.display());
        // Failed runs broadcast nothing
        if let Err(e) = runner.run_task(event.task).await {
            tracing::warn!("Rebuild of '{}' failed, still watching: {}", event.task, e);
        }
    }
}

/// What to broadcast after a successful task run.
pub fn message_for(report: &TaskReport, output: &Path) -> ReloadMessage {
    if report.name != STYLES_TASK {
        return ReloadMessage::Reload;
    }

    let path = report
        .output
        .written
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "css"))
        .and_then(|p| p.strip_prefix(output).ok())
        .map(|rel| {
            let parts: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("/{}", parts.join("/"))
        })
        .unwrap_or_default();

    ReloadMessage::Stylesheet { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use siteforge_pipeline::{FileGroup, Task, TaskError, TaskOutput, TaskRegistry};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::tempdir;

    struct Fixed {
        name: &'static str,
        fail: bool,
    }

    struct Panics;

    impl Task for Panics {
        fn name(&self) -> &'static str {
            "images"
        }

        fn description(&self) -> &'static str {
            "always panics"
        }

        fn run(&self) -> Result<TaskOutput, TaskError> {
            panic!("decoder exploded")
        }
    }

    /// Records the watched file's contents on every run.
    struct Snapshot {
        path: PathBuf,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Task for Snapshot {
        fn name(&self) -> &'static str {
            "markup"
        }

        fn description(&self) -> &'static str {
            "records file contents"
        }

        fn run(&self) -> Result<TaskOutput, TaskError> {
            let contents = std::fs::read_to_string(&self.path)
                .map_err(|e| TaskError::read(self.path.display(), e))?;
            self.seen.lock().unwrap().push(contents);
            Ok(TaskOutput::new())
        }
    }

    impl Task for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "test task"
        }

        fn run(&self) -> Result<TaskOutput, TaskError> {
            if self.fail {
                return Err(TaskError::Other("boom".to_string()));
            }
            let mut output = TaskOutput::new();
            output.push(format!("dist/{}.css", self.name));
            Ok(output)
        }
    }

    fn report(name: &str, written: &[&str]) -> TaskReport {
        TaskReport {
            name: name.to_string(),
            output: TaskOutput {
                written: written.iter().map(PathBuf::from).collect(),
            },
            duration_ms: 1,
        }
    }

    #[test]
    fn styles_swap_stylesheets() {
        let msg = message_for(
            &report("styles", &["dist/css/style.css", "dist/css/style.min.css"]),
            Path::new("dist"),
        );
        assert_eq!(
            msg,
            ReloadMessage::Stylesheet {
                path: "/css/style.css".to_string()
            }
        );
    }

    #[test]
    fn other_tasks_reload() {
        let msg = message_for(&report("markup", &["dist/index.html"]), Path::new("dist"));
        assert_eq!(msg, ReloadMessage::Reload);
    }

    #[tokio::test]
    async fn failures_keep_the_loop_alive() {
        let mut registry = TaskRegistry::new();
        registry
            .register(Fixed {
                name: "styles",
                fail: false,
            })
            .register(Fixed {
                name: "markup",
                fail: true,
            })
            .register(Panics);
        let hub = ReloadHub::new();
        let mut messages = hub.subscribe();
        let runner = notifying(Runner::new(registry), hub, PathBuf::from("dist"));

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(rebuild_loop(runner, rx));

        for task in ["markup", "images", "nonexistent", "styles"] {
            tx.send(WatchEvent {
                task,
                path: PathBuf::from("src/x"),
            })
            .await
            .unwrap();
        }

        let msg = tokio::time::timeout(Duration::from_secs(3), messages.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            msg,
            ReloadMessage::Stylesheet {
                path: "/styles.css".to_string()
            }
        );

        drop(tx);
        handle.await.unwrap();
        assert!(messages.try_recv().is_err());
    }

    #[tokio::test]
    async fn last_write_in_a_burst_is_rebuilt() {
        let temp = tempdir().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let page = root.join("index.html");
        std::fs::write(&page, "v0").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = TaskRegistry::new();
        registry.register(Snapshot {
            path: page.clone(),
            seen: Arc::clone(&seen),
        });

        let bindings = Bindings::new(vec![(
            FileGroup::new(&root, &["**/*.html"]).unwrap(),
            "markup",
        )]);
        let (watcher, rx) = FileWatcher::new(&root, bindings).unwrap();
        let handle = tokio::spawn(rebuild_loop(Runner::new(registry), rx));
        tokio::time::sleep(Duration::from_millis(100)).await;

        std::fs::write(&page, "v1").unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        std::fs::write(&page, "v2").unwrap();
        tokio::time::sleep(Duration::from_millis(800)).await;

        drop(watcher);
        handle.abort();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.last().map(String::as_str), Some("v2"), "runs saw {seen:?}");
    }
}
