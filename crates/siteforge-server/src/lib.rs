//! Development server and watch loop for siteforge.
//!
//! Serves the build output with live reload, watches the source tree and
//! re-runs the task bound to each changed file.

pub mod reload;
pub mod server;
pub mod session;
pub mod watcher;

pub use reload::{ReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use session::WatchSession;
pub use watcher::{Bindings, FileWatcher, WatchEvent};
