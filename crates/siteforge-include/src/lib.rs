//! File include engine for markup and script sources.
//!
//! Expands `@@include('path', {json})` directives relative to the including
//! file and substitutes `@@name` variables passed down through the include
//! chain.

pub mod context;
pub mod directive;
pub mod expand;

pub use context::Context;
pub use directive::{find_directives, Directive, DirectiveError};
pub use expand::{IncludeError, Includer, DEFAULT_PREFIX};
