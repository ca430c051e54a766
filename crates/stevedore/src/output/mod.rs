//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers keyed on service kind

pub mod color;

use crate::domain::{ServiceKind, ServiceName, ServiceRecord};
use crate::render::{NodeView, StyleSheet};
use color::{bold, colorize_kind, colorize_name, dimmed};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

// ============================================================================
// Output Configuration
// ============================================================================

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `STEVEDORE_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("STEVEDORE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self { use_colors }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// JSON Shapes
// ============================================================================

/// A service as printed in listings.
#[derive(Debug, Serialize)]
struct ServiceSummary<'a> {
    name: &'a ServiceName,
    kind: &'a ServiceKind,
    dependencies: &'a [ServiceName],
}

impl<'a> From<&'a ServiceRecord> for ServiceSummary<'a> {
    fn from(record: &'a ServiceRecord) -> Self {
        Self {
            name: record.name(),
            kind: record.kind(),
            dependencies: record.dependencies(),
        }
    }
}

/// A graph edge as printed by `graph`.
#[derive(Debug, Serialize)]
struct EdgeSummary<'a> {
    from: &'a ServiceName,
    to: &'a ServiceName,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a list of services in the specified format
pub fn print_services(
    records: &[&ServiceRecord],
    styles: &StyleSheet,
    mode: OutputMode,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => write_services_text(&mut handle, records, styles, &config),
        OutputMode::Json => write_json(
            &mut handle,
            &records
                .iter()
                .map(|r| ServiceSummary::from(*r))
                .collect::<Vec<_>>(),
        ),
    }
}

/// Print graph edges (`dependency -> dependent`) in the specified format
pub fn print_edges(edges: &[(&ServiceName, &ServiceName)], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => write_edges_text(&mut handle, edges, &config),
        OutputMode::Json => write_json(
            &mut handle,
            &edges
                .iter()
                .map(|&(from, to)| EdgeSummary { from, to })
                .collect::<Vec<_>>(),
        ),
    }
}

/// Print per-node display attributes and positions
pub fn print_node_views(
    views: &[NodeView],
    styles: &StyleSheet,
    mode: OutputMode,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => write_node_views_text(&mut handle, views, styles, &config),
        OutputMode::Json => write_json(&mut handle, &views),
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

// ============================================================================
// Writers
// ============================================================================

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

fn write_services_text<W: Write>(
    w: &mut W,
    records: &[&ServiceRecord],
    styles: &StyleSheet,
    config: &OutputConfig,
) -> io::Result<()> {
    if records.is_empty() {
        writeln!(w, "No services found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} service(s):", records.len())?;
    writeln!(w)?;

    for record in records {
        write!(
            w,
            "  {}  {}",
            colorize_name(record.name().as_str(), config),
            colorize_kind(record.kind(), styles, config)
        )?;

        if !record.dependencies().is_empty() {
            let links: Vec<_> = record
                .dependencies()
                .iter()
                .map(ServiceName::as_str)
                .collect();
            write!(w, "  {} {}", dimmed("links:", config), links.join(", "))?;
        }
        writeln!(w)?;
    }

    Ok(())
}

fn write_edges_text<W: Write>(
    w: &mut W,
    edges: &[(&ServiceName, &ServiceName)],
    config: &OutputConfig,
) -> io::Result<()> {
    if edges.is_empty() {
        writeln!(w, "No links.")?;
        return Ok(());
    }

    for (from, to) in edges {
        writeln!(
            w,
            "{} {} {}",
            colorize_name(from.as_str(), config),
            dimmed("->", config),
            colorize_name(to.as_str(), config)
        )?;
    }

    Ok(())
}

fn write_node_views_text<W: Write>(
    w: &mut W,
    views: &[NodeView],
    styles: &StyleSheet,
    config: &OutputConfig,
) -> io::Result<()> {
    if views.is_empty() {
        writeln!(w, "No services found.")?;
        return Ok(());
    }

    writeln!(w, "{}", bold("Layout:", config))?;
    for view in views {
        writeln!(
            w,
            "  {}  {}  {} {} {} {}  {} ({:.3}, {:.3})",
            colorize_name(view.name.as_str(), config),
            colorize_kind(&view.kind, styles, config),
            dimmed("color:", config),
            view.style.color,
            dimmed("size:", config),
            view.style.size,
            dimmed("at:", config),
            view.position.x,
            view.position.y
        )?;
    }

    Ok(())
}
