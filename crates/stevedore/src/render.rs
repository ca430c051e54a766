//! Display attributes and layout for drawing the dependency graph.
//!
//! The core only knows each node's name and kind. This module maps a kind to
//! a [`NodeStyle`] through a [`StyleSheet`], places nodes on a circle, and
//! writes Graphviz DOT for external renderers.

use crate::domain::{ServiceKind, ServiceName};
use crate::error::Result;
use crate::registry::ServiceRegistry;
use petgraph::dot::{Config, Dot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// Node size used for every kind without an explicit style.
pub const DEFAULT_NODE_SIZE: u32 = 600;

/// Node size used for applications.
pub const APPLICATION_NODE_SIZE: u32 = 1200;

/// Color used for every kind without an explicit style.
pub const DEFAULT_NODE_COLOR: &str = "red";

/// How a node is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    /// Fill color, as a color name understood by the renderer
    pub color: String,

    /// Relative node size
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    DEFAULT_NODE_SIZE
}

impl NodeStyle {
    /// Create a style
    pub fn new(color: impl Into<String>, size: u32) -> Self {
        Self {
            color: color.into(),
            size,
        }
    }
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_COLOR, DEFAULT_NODE_SIZE)
    }
}

/// Kind to style mapping with a fallback for unlisted kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    styles: BTreeMap<String, NodeStyle>,
    fallback: NodeStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        let styles = BTreeMap::from([
            (
                ServiceKind::FRONT.to_string(),
                NodeStyle::new("yellow", DEFAULT_NODE_SIZE),
            ),
            (
                ServiceKind::PERF.to_string(),
                NodeStyle::new("blue", DEFAULT_NODE_SIZE),
            ),
            (
                ServiceKind::APPLICATION.to_string(),
                NodeStyle::new("green", APPLICATION_NODE_SIZE),
            ),
        ]);

        Self {
            styles,
            fallback: NodeStyle::default(),
        }
    }
}

impl StyleSheet {
    /// The built-in styles with `overrides` applied on top.
    pub fn with_overrides(overrides: &BTreeMap<String, NodeStyle>) -> Self {
        let mut sheet = Self::default();
        sheet.styles.extend(
            overrides
                .iter()
                .map(|(kind, style)| (kind.clone(), style.clone())),
        );
        sheet
    }

    /// Style for a kind.
    pub fn style_for(&self, kind: &ServiceKind) -> &NodeStyle {
        self.styles.get(kind.as_str()).unwrap_or(&self.fallback)
    }
}

/// A point in the layout plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

/// Everything a renderer needs to draw one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    /// Service name, used as the label
    pub name: ServiceName,
    /// Service kind
    pub kind: ServiceKind,
    /// Resolved display style
    pub style: NodeStyle,
    /// Layout position
    pub position: Position,
}

/// Place `count` nodes evenly on the unit circle.
///
/// The first node sits at angle zero and the rest follow counter-clockwise.
/// A single node sits at the origin.
pub fn circular_layout(count: usize) -> Vec<Position> {
    if count == 1 {
        return vec![Position { x: 0.0, y: 0.0 }];
    }

    #[allow(clippy::cast_precision_loss)]
    let step = TAU / count as f64;
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = step * i as f64;
            Position {
                x: angle.cos(),
                y: angle.sin(),
            }
        })
        .collect()
}

/// Display attributes and positions for every node of the registry's graph,
/// in graph order.
///
/// # Errors
///
/// Fails if the registry's graph cannot be built.
pub fn node_views(registry: &ServiceRegistry, styles: &StyleSheet) -> Result<Vec<NodeView>> {
    let graph = registry.graph()?;
    let positions = circular_layout(graph.node_count());

    Ok(graph
        .nodes()
        .zip(positions)
        .filter_map(|(name, position)| {
            let record = registry.get(name.as_str())?;
            Some(NodeView {
                name: name.clone(),
                kind: record.kind().clone(),
                style: styles.style_for(record.kind()).clone(),
                position,
            })
        })
        .collect())
}

/// Graphviz DOT for the registry's graph, with nodes filled by kind.
///
/// # Errors
///
/// Fails if the registry's graph cannot be built.
pub fn to_dot(registry: &ServiceRegistry, styles: &StyleSheet) -> Result<String> {
    let graph = registry.graph()?;

    // Dot needs displayable edge weights; links carry no label.
    let labelled = graph.inner().map(|_, name| name.clone(), |_, _| "");

    let dot = Dot::with_attr_getters(
        &labelled,
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &|_, _| String::new(),
        &|_, (_, name)| {
            let style = registry
                .get(name.as_str())
                .map_or(&styles.fallback, |record| styles.style_for(record.kind()));
            format!(
                "label = \"{}\" style = filled fillcolor = \"{}\"",
                escape_dot(name.as_str()),
                escape_dot(&style.color)
            )
        },
    )
    .to_string();

    Ok(dot)
}

/// Escape text for a double-quoted DOT string.
fn escape_dot(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_styles() {
        let sheet = StyleSheet::default();

        assert_eq!(sheet.style_for(&"front".into()).color, "yellow");
        assert_eq!(sheet.style_for(&"perf".into()).color, "blue");

        let app = sheet.style_for(&"application".into());
        assert_eq!(app.color, "green");
        assert_eq!(app.size, APPLICATION_NODE_SIZE);

        let other = sheet.style_for(&"database".into());
        assert_eq!(other, &NodeStyle::default());
    }

    #[test]
    fn test_overrides_merge_over_defaults() {
        let overrides = BTreeMap::from([
            ("perf".to_string(), NodeStyle::new("purple", 900)),
            ("cache".to_string(), NodeStyle::new("orange", 300)),
        ]);

        let sheet = StyleSheet::with_overrides(&overrides);

        assert_eq!(sheet.style_for(&"perf".into()).color, "purple");
        assert_eq!(sheet.style_for(&"cache".into()).size, 300);
        assert_eq!(sheet.style_for(&"front".into()).color, "yellow");
    }

    #[test]
    fn test_circular_layout() {
        assert!(circular_layout(0).is_empty());
        assert_eq!(circular_layout(1), [Position { x: 0.0, y: 0.0 }]);

        let four = circular_layout(4);
        assert_eq!(four.len(), 4);
        assert!(close(four[0].x, 1.0) && close(four[0].y, 0.0));
        assert!(close(four[1].x, 0.0) && close(four[1].y, 1.0));
        assert!(close(four[2].x, -1.0) && close(four[2].y, 0.0));
        assert!(close(four[3].x, 0.0) && close(four[3].y, -1.0));
    }

    #[test]
    fn test_node_views_follow_graph_order() {
        let registry =
            ServiceRegistry::from_yaml_str("db:\nshop: {type: application, links: [db]}\n")
                .unwrap();

        let views = node_views(&registry, &StyleSheet::default()).unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].name.as_str(), "db");
        assert_eq!(views[0].style.color, DEFAULT_NODE_COLOR);
        assert_eq!(views[1].kind.as_str(), "application");
        assert_eq!(views[1].style.size, APPLICATION_NODE_SIZE);
    }

    #[test]
    fn test_to_dot() {
        let registry =
            ServiceRegistry::from_yaml_str("db:\nweb: {type: front, links: ['db:database']}\n")
                .unwrap();

        let dot = to_dot(&registry, &StyleSheet::default()).unwrap();

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("label = \"web\""));
        assert!(dot.contains("fillcolor = \"yellow\""));
        assert!(dot.contains("0 -> 1"));
    }

    #[test]
    fn test_to_dot_escapes_quotes_and_backslashes() {
        let registry = ServiceRegistry::from_yaml_str("'we\"b':\n'c\\d':\n").unwrap();

        let dot = to_dot(&registry, &StyleSheet::default()).unwrap();

        assert!(dot.contains(r#"label = "we\"b""#), "{dot}");
        assert!(dot.contains(r#"label = "c\\d""#), "{dot}");
        assert!(!dot.contains(r#"label = "we"b""#));
    }
}
