//! Task registry for looking up tasks by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::traits::Task;

/// A registry of named tasks.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Arc<dyn Task>>,
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.names())
            .finish()
    }
}

impl TaskRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its own name, replacing any previous task with
    /// that name.
    pub fn register<T: Task + 'static>(&mut self, task: T) -> &mut Self {
        self.register_arc(Arc::new(task))
    }

    /// Register an already shared task.
    pub fn register_arc(&mut self, task: Arc<dyn Task>) -> &mut Self {
        let name = task.name().to_string();
        if self.tasks.insert(name.clone(), task).is_some() {
            tracing::debug!("Replaced task '{}'", name);
        }
        self
    }

    /// Look up a task by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(name).cloned()
    }

    /// Check if a task is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered task names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.tasks.keys().map(|s| s.as_str()).collect()
    }

    /// Iterate over tasks in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Task>> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{TaskError, TaskKind, TaskOutput};

    struct Named(&'static str, &'static str);

    impl Task for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            self.1
        }

        fn run(&self) -> Result<TaskOutput, TaskError> {
            Ok(TaskOutput::new())
        }
    }

    #[test]
    fn registers_and_looks_up_tasks() {
        let mut registry = TaskRegistry::new();
        registry.register(Named("styles", "a")).register(Named("markup", "b"));

        assert!(registry.contains("styles"));
        assert!(!registry.contains("fonts"));
        assert_eq!(registry.names(), vec!["markup", "styles"]);
        assert_eq!(registry.get("markup").unwrap().kind(), TaskKind::Writer);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = TaskRegistry::new();
        registry.register(Named("styles", "old"));
        registry.register(Named("styles", "new"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("styles").unwrap().description(), "new");
    }
}
