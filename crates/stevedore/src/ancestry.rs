//! Transitive closures over the dependency graph.
//!
//! [`ancestors`] walks predecessor edges (everything the seeds depend on),
//! [`descendants`] walks successor edges (everything that depends on the
//! seeds). Both use an explicit stack and a visited set: each node is expanded
//! at most once, which bounds the walk to O(V + E), keeps diamonds linear and
//! stops on cycles.
//!
//! Seeds are not part of the result unless one of them is reached from
//! another seed, or from itself through a cycle.

use crate::domain::ServiceName;
use crate::error::Result;
use crate::graph::DependencyGraph;
use petgraph::Direction;
use std::collections::{BTreeSet, HashSet};

/// Every service the seeds depend on, directly or transitively.
///
/// # Errors
///
/// Returns [`crate::error::Error::ServiceNotFound`] if a seed is not a node of
/// `graph`.
pub fn ancestors<I, S>(graph: &DependencyGraph, seeds: I) -> Result<BTreeSet<ServiceName>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    closure(graph, seeds, Direction::Incoming)
}

/// Every service that depends on the seeds, directly or transitively.
///
/// # Errors
///
/// Returns [`crate::error::Error::ServiceNotFound`] if a seed is not a node of
/// `graph`.
pub fn descendants<I, S>(graph: &DependencyGraph, seeds: I) -> Result<BTreeSet<ServiceName>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    closure(graph, seeds, Direction::Outgoing)
}

fn closure<I, S>(
    graph: &DependencyGraph,
    seeds: I,
    direction: Direction,
) -> Result<BTreeSet<ServiceName>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let inner = graph.inner();

    // Resolve every seed before walking so an unknown name fails fast.
    let mut stack = Vec::new();
    for seed in seeds {
        let node = graph.index_of(seed.as_ref())?;
        stack.extend(inner.neighbors_directed(node, direction));
    }

    let mut visited = HashSet::new();
    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        stack.extend(
            inner
                .neighbors_directed(node, direction)
                .filter(|next| !visited.contains(next)),
        );
    }

    Ok(visited.into_iter().map(|node| inner[node].clone()).collect())
}
