//! Asset transforms for siteforge.
//!
//! Each module provides one [`Task`](siteforge_pipeline::Task): HTML
//! assembly, SCSS, scripts, images, fonts and the font stylesheet, the SVG
//! sprite, and the output purge. [`pipeline`] wires them into the standard
//! registry and build plan.

pub mod config;
pub mod fonts;
pub mod fontstyle;
pub mod images;
pub mod markup;
pub mod output;
pub mod pipeline;
pub mod purge;
pub mod scripts;
pub mod sprite;
pub mod styles;

pub use config::SiteConfig;
pub use pipeline::{build_plan, standard_registry, watch_bindings};
