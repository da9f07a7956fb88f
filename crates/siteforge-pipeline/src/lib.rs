//! Task registry, plan composition and execution for siteforge.
//!
//! Tasks are named units of file transformation. Plans arrange them into
//! series and parallel groups as plain data; the [`Runner`] executes a plan
//! and stops at the first failure.

pub mod pattern;
pub mod plan;
pub mod registry;
pub mod runner;
pub mod traits;

pub use pattern::{expand_braces, FileGroup, PatternError};
pub use plan::{PlanError, Step};
pub use registry::TaskRegistry;
pub use runner::{Listener, RunError, RunReport, Runner, TaskReport};
pub use traits::{Task, TaskError, TaskKind, TaskOutput};
