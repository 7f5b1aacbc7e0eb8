//! Parallel discovery over several sample documents
//!
//! Uses Rayon to read one document per task. Each read is still a single
//! sequential parse; only whole documents run side by side, sharing the
//! read-only catch-all configuration.

use super::builder::{catch_all_config, discover_file, DiscoveredNode};
use crate::error::Result;
use crate::reader::ReaderOptions;
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

/// Discover each file in parallel and merge the shapes in input order.
///
/// Fails with the first error in input order.
pub fn discover_all<P>(paths: &[P], options: ReaderOptions) -> Result<DiscoveredNode>
where
    P: AsRef<Path> + Sync,
{
    let config = catch_all_config();
    let trees: Vec<Result<DiscoveredNode>> = paths
        .par_iter()
        .map(|path| discover_file(path, &config, options))
        .collect();

    let mut merged = DiscoveredNode::root();
    for tree in trees {
        merged.merge(tree?);
    }
    debug!(documents = paths.len(), "merged discovered structure");
    Ok(merged)
}
