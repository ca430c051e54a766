//! Service dependency graph using petgraph.
//!
//! # Edge Direction Convention
//!
//! Edges point from **dependency to dependent**: if `web` links to `api`, the
//! graph holds `api -> web`. Predecessors of a node are therefore the services
//! it depends on, successors the services that depend on it.
//!
//! Nodes hold the [`ServiceName`] only; records stay owned by the
//! [`ServiceRegistry`] and are looked up by name. Every service of the
//! registry is a node, including services with no links at all.

use crate::domain::ServiceName;
use crate::error::{Error, Result};
use crate::registry::ServiceRegistry;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};

/// Directed graph of services, derived from exactly one registry.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Edge direction: source (dependency) -> target (dependent).
    graph: DiGraph<ServiceName, ()>,

    /// Mapping from service name to graph node.
    ///
    /// Every node of `graph` has exactly one entry.
    node_map: HashMap<ServiceName, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph for a registry.
    ///
    /// Nodes are inserted in registry (name) order, so two registries with the
    /// same content always produce the same graph. Repeated links between the
    /// same pair of services produce a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedDependency`] if a record links to a service
    /// missing from `registry`.
    pub fn build(registry: &ServiceRegistry) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(registry.len(), registry.len());
        let mut node_map = HashMap::with_capacity(registry.len());

        let nodes: Vec<_> = registry
            .iter()
            .map(|record| {
                let node = graph.add_node(record.name().clone());
                node_map.insert(record.name().clone(), node);
                (node, record)
            })
            .collect();

        for (dependent, record) in nodes {
            for dependency in record.dependencies() {
                let source =
                    node_map
                        .get(dependency)
                        .ok_or_else(|| Error::UnresolvedDependency {
                            service: record.name().to_string(),
                            dependency: dependency.to_string(),
                        })?;
                graph.update_edge(*source, dependent, ());
            }
        }

        tracing::debug!(
            services = graph.node_count(),
            links = graph.edge_count(),
            "Built dependency graph"
        );

        Ok(Self { graph, node_map })
    }

    /// Services `name` directly depends on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceNotFound`] if `name` is not a node.
    pub fn predecessors(&self, name: &str) -> Result<BTreeSet<&ServiceName>> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Services that directly depend on `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceNotFound`] if `name` is not a node.
    pub fn successors(&self, name: &str) -> Result<BTreeSet<&ServiceName>> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Whether the graph has a node for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// All nodes, in insertion (name) order.
    pub fn nodes(&self) -> impl Iterator<Item = &ServiceName> {
        self.graph.node_weights()
    }

    /// All edges as `(dependency, dependent)` pairs, sorted.
    pub fn edges(&self) -> Vec<(&ServiceName, &ServiceName)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| (&self.graph[edge.source()], &self.graph[edge.target()]))
            .collect();
        edges.sort();
        edges
    }

    /// Services that depend on nothing.
    pub fn roots(&self) -> Vec<&ServiceName> {
        self.graph
            .externals(Direction::Incoming)
            .map(|node| &self.graph[node])
            .collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn index_of(&self, name: &str) -> Result<NodeIndex> {
        self.node_map
            .get(name)
            .copied()
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))
    }

    pub(crate) fn inner(&self) -> &DiGraph<ServiceName, ()> {
        &self.graph
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Result<BTreeSet<&ServiceName>> {
        let node = self.index_of(name)?;
        Ok(self
            .graph
            .neighbors_directed(node, direction)
            .map(|neighbor| &self.graph[neighbor])
            .collect())
    }
}
