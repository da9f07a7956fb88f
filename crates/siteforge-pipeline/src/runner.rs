//! Plan execution.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::plan::Step;
use crate::registry::TaskRegistry;
use crate::traits::{TaskError, TaskOutput};

/// Result of a single task run.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Task name
    pub name: String,

    /// Files the task wrote
    pub output: TaskOutput,

    /// Elapsed time in milliseconds
    pub duration_ms: u64,
}

/// Result of running a whole plan.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Completed tasks in completion order
    pub tasks: Vec<TaskReport>,

    /// Total elapsed time in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Total number of files written.
    pub fn files_written(&self) -> usize {
        self.tasks.iter().map(|t| t.output.len()).sum()
    }
}

/// Errors that abort a plan.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: TaskError,
    },

    #[error("Task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },
}

/// Callback invoked after each task completes successfully.
pub type Listener = Arc<dyn Fn(&TaskReport) + Send + Sync>;

type StepFuture = Pin<Box<dyn Future<Output = Result<Vec<TaskReport>, RunError>> + Send>>;

/// Executes plans against a task registry.
#[derive(Clone)]
pub struct Runner {
    registry: Arc<TaskRegistry>,
    listener: Option<Listener>,
}

impl Runner {
    /// Create a runner over a registry.
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            listener: None,
        }
    }

    /// Call `listener` after every completed task.
    pub fn with_listener(mut self, listener: impl Fn(&TaskReport) + Send + Sync + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run a plan to completion.
    ///
    /// The first failing task stops the plan: no later series step starts.
    /// Siblings already running in a parallel group finish before the error
    /// is returned.
    pub async fn run(&self, plan: &Step) -> Result<RunReport, RunError> {
        let start = Instant::now();
        let tasks = self.clone().run_step(plan.clone()).await?;

        Ok(RunReport {
            tasks,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Run a single task by name.
    pub async fn run_task(&self, name: &str) -> Result<TaskReport, RunError> {
        let mut reports = self.clone().run_step(Step::task(name)).await?;
        reports.pop().ok_or_else(|| RunError::UnknownTask(name.to_string()))
    }

    fn run_step(self, step: Step) -> StepFuture {
        Box::pin(async move {
            match step {
                Step::Task(name) => self.run_leaf(name).await.map(|r| vec![r]),

                Step::Series(steps) => {
                    let mut reports = Vec::new();
                    for step in steps {
                        reports.extend(self.clone().run_step(step).await?);
                    }
                    Ok(reports)
                }

                Step::Parallel(steps) => {
                    let mut set = JoinSet::new();
                    for step in steps {
                        set.spawn(self.clone().run_step(step));
                    }

                    let mut reports = Vec::new();
                    let mut first_error = None;
                    while let Some(joined) = set.join_next().await {
                        match joined {
                            Ok(Ok(done)) => reports.extend(done),
                            Ok(Err(e)) => {
                                if first_error.is_none() {
                                    first_error = Some(e);
                                }
                            }
                            Err(e) => {
                                if first_error.is_none() {
                                    first_error = Some(RunError::Panicked {
                                        task: "parallel group".to_string(),
                                        message: e.to_string(),
                                    });
                                }
                            }
                        }
                    }

                    match first_error {
                        Some(e) => Err(e),
                        None => Ok(reports),
                    }
                }
            }
        })
    }

    async fn run_leaf(&self, name: String) -> Result<TaskReport, RunError> {
        let task = self
            .registry
            .get(&name)
            .ok_or_else(|| RunError::UnknownTask(name.clone()))?;

        tracing::info!("Starting '{}'", name);
        let start = Instant::now();

        let output = tokio::task::spawn_blocking(move || task.run())
            .await
            .map_err(|e| {
                tracing::error!("'{}' panicked: {}", name, e);
                RunError::Panicked {
                    task: name.clone(),
                    message: e.to_string(),
                }
            })?
            .map_err(|source| {
                tracing::error!("'{}' failed: {}", name, source);
                RunError::TaskFailed {
                    task: name.clone(),
                    source,
                }
            })?;

        let report = TaskReport {
            name,
            output,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Finished '{}' ({} files) in {}ms",
            report.name,
            report.output.len(),
            report.duration_ms
        );

        if let Some(listener) = &self.listener {
            listener(&report);
        }

        Ok(report)
    }
}
