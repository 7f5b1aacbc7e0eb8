//! Configuration Module
//!
//! - Tree: arena of binding rules with exact and fallback lookups
//! - Bootstrap: the fixed cfg-of-cfg and the configuration document loader

pub mod bootstrap;
pub mod tree;

pub use bootstrap::{bootstrap_config, WILDCARD};
pub use tree::{ConfigNode, ConfigTree, NodeId};
