//! Execution plans expressed as data.
//!
//! A plan is a tree of steps: a single task, a series of steps that run one
//! after another, or a parallel group whose members have no ordering
//! constraints among them.

use std::collections::BTreeSet;
use std::fmt;

use crate::registry::TaskRegistry;
use crate::traits::TaskKind;

/// A node in an execution plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run one registered task
    Task(String),
    /// Run children strictly in order
    Series(Vec<Step>),
    /// Run children concurrently
    Parallel(Vec<Step>),
}

/// Errors found while validating a plan.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    #[error("Purge task '{purge}' runs after writer '{writer}'")]
    PurgeAfterWriter { purge: String, writer: String },

    #[error("Purge task '{purge}' runs in parallel with writer '{writer}'")]
    PurgeParallelToWriter { purge: String, writer: String },
}

impl Step {
    pub fn task(name: impl Into<String>) -> Self {
        Self::Task(name.into())
    }

    pub fn series(steps: impl IntoIterator<Item = Step>) -> Self {
        Self::Series(steps.into_iter().collect())
    }

    pub fn parallel(steps: impl IntoIterator<Item = Step>) -> Self {
        Self::Parallel(steps.into_iter().collect())
    }

    /// Run the named tasks one after another.
    pub fn series_of<S: AsRef<str>>(names: &[S]) -> Self {
        Self::series(names.iter().map(|n| Self::task(n.as_ref())))
    }

    /// Every task name in this step, in plan order.
    pub fn task_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Task(name) => out.push(name),
            Self::Series(steps) | Self::Parallel(steps) => {
                for step in steps {
                    step.collect_names(out);
                }
            }
        }
    }

    /// Check the plan against a registry.
    ///
    /// Every task must be registered, and every purge task must complete
    /// before any writer starts.
    pub fn validate(&self, registry: &TaskRegistry) -> Result<(), PlanError> {
        for name in self.task_names() {
            if !registry.contains(name) {
                return Err(PlanError::UnknownTask(name.to_string()));
            }
        }
        self.check_purge_order(registry)
    }

    fn check_purge_order(&self, registry: &TaskRegistry) -> Result<(), PlanError> {
        match self {
            Self::Task(_) => Ok(()),

            Self::Series(steps) => {
                let mut writer_seen: Option<String> = None;
                for step in steps {
                    step.check_purge_order(registry)?;
                    if let (Some(writer), Some(purge)) =
                        (&writer_seen, step.first_of(registry, TaskKind::Purge))
                    {
                        return Err(PlanError::PurgeAfterWriter {
                            purge,
                            writer: writer.clone(),
                        });
                    }
                    if writer_seen.is_none() {
                        writer_seen = step.first_of(registry, TaskKind::Writer);
                    }
                }
                Ok(())
            }

            Self::Parallel(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    step.check_purge_order(registry)?;
                    let Some(purge) = step.first_of(registry, TaskKind::Purge) else {
                        continue;
                    };
                    let writer = steps
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .find_map(|(_, other)| other.first_of(registry, TaskKind::Writer));
                    if let Some(writer) = writer {
                        return Err(PlanError::PurgeParallelToWriter { purge, writer });
                    }
                }
                Ok(())
            }
        }
    }

    fn first_of(&self, registry: &TaskRegistry, kind: TaskKind) -> Option<String> {
        self.task_names()
            .into_iter()
            .find(|name| registry.get(name).is_some_and(|t| t.kind() == kind))
            .map(str::to_string)
    }

    /// Distinct task names in this step.
    pub fn unique_tasks(&self) -> BTreeSet<&str> {
        self.task_names().into_iter().collect()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, steps) = match self {
            Self::Task(name) => return f.write_str(name),
            Self::Series(steps) => ("series", steps),
            Self::Parallel(steps) => ("parallel", steps),
        };
        write!(f, "{}(", label)?;
        for (i, step) in steps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", step)?;
        }
        f.write_str(")")
    }
}
