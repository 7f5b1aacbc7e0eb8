//! Discovery Module
//!
//! Bootstrap path for unknown documents:
//! - Builder: catch-all configuration and the DiscoveredNode tree
//! - Template: writes a discovered tree as an editable configuration
//! - Parallel: discovery across several sample documents

pub mod builder;
pub mod parallel;
pub mod template;

pub use builder::{catch_all_config, discover, discover_file, discover_with_options, DiscoveredNode};
pub use parallel::discover_all;
pub use template::{write_template, TemplateOptions, TemplateWriter};
