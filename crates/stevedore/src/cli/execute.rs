//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands. Every
//! command works on the registry already loaded into the [`App`].

use anyhow::{Context, Result};

use super::args::{AppsArgs, ClosureArgs, GraphArgs, LayoutArgs, ListArgs};
use crate::app::App;
use crate::output::{self, OutputMode};
use crate::query::{self, ServiceFilter};
use crate::render;

/// Filters selected by the `list` flags.
///
/// Every `--kind` and every `--name` adds one filter; the listing is their
/// union. No flags selects everything.
pub fn list_filters(args: &ListArgs) -> Vec<ServiceFilter> {
    let mut filters: Vec<_> = args
        .kinds
        .iter()
        .map(|kind| ServiceFilter::kind(kind.as_str()))
        .collect();

    if !args.names.is_empty() {
        filters.push(ServiceFilter::names_in(args.names.iter().map(String::as_str)));
    }

    if filters.is_empty() {
        filters.push(ServiceFilter::All);
    }

    filters
}

/// Execute the list command
pub fn execute_list(app: &App, args: &ListArgs, output_mode: OutputMode) -> Result<()> {
    let selected = query::compose(app.registry(), &list_filters(args));
    let records: Vec<_> = selected.iter().collect();

    output::print_services(&records, &app.style_sheet(), output_mode)?;
    Ok(())
}

/// Execute the graph command
pub fn execute_graph(app: &App, args: &GraphArgs, output_mode: OutputMode) -> Result<()> {
    if args.dot {
        let dot = render::to_dot(app.registry(), &app.style_sheet())
            .context("Failed to build dependency graph")?;
        output::print_message(dot.trim_end())?;
        return Ok(());
    }

    let graph = app
        .registry()
        .graph()
        .context("Failed to build dependency graph")?;
    output::print_edges(&graph.edges(), output_mode)?;
    Ok(())
}

/// Execute the ancestors command
pub fn execute_ancestors(app: &App, args: &ClosureArgs, output_mode: OutputMode) -> Result<()> {
    let records = app
        .registry()
        .ancestors(&args.names)
        .with_context(|| format!("Failed to resolve dependencies of {}", args.names.join(", ")))?;

    output::print_services(&records, &app.style_sheet(), output_mode)?;
    Ok(())
}

/// Execute the dependents command
pub fn execute_dependents(app: &App, args: &ClosureArgs, output_mode: OutputMode) -> Result<()> {
    let records = app
        .registry()
        .dependents(&args.names)
        .with_context(|| format!("Failed to resolve dependents of {}", args.names.join(", ")))?;

    output::print_services(&records, &app.style_sheet(), output_mode)?;
    Ok(())
}

/// Execute the apps command
pub fn execute_apps(app: &App, args: &AppsArgs, output_mode: OutputMode) -> Result<()> {
    let records = query::by_applications(app.registry(), args.names.as_slice())
        .context("Failed to resolve application dependencies")?;

    output::print_services(&records, &app.style_sheet(), output_mode)?;
    Ok(())
}

/// Execute the layout command
pub fn execute_layout(app: &App, _args: &LayoutArgs, output_mode: OutputMode) -> Result<()> {
    let styles = app.style_sheet();
    let views = render::node_views(app.registry(), &styles)
        .context("Failed to build dependency graph")?;

    output::print_node_views(&views, &styles, output_mode)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StevedoreConfig;
    use crate::registry::ServiceRegistry;

    fn app(yaml: &str) -> App {
        App::from_registry(
            ServiceRegistry::from_yaml_str(yaml).unwrap(),
            StevedoreConfig::default(),
        )
    }

    #[test]
    fn test_list_filters_default_to_all() {
        assert_eq!(list_filters(&ListArgs::default()), [ServiceFilter::All]);
    }

    #[test]
    fn test_list_filters_union_kinds_and_names() {
        let args = ListArgs {
            kinds: vec!["application".to_string(), "perf".to_string()],
            names: vec!["db".to_string()],
        };

        let registry = ServiceRegistry::from_yaml_str(
            "db:\ncache:\nshop: {type: application}\nbench: {type: perf}\n",
        )
        .unwrap();
        let selected = query::compose(&registry, &list_filters(&args));

        let names: Vec<_> = selected.names().map(ToString::to_string).collect();
        assert_eq!(names, ["bench", "db", "shop"]);
    }

    #[test]
    fn test_unresolved_link_reports_context() {
        let app = app("web: {links: [api]}\n");

        let err = execute_graph(&app, &GraphArgs::default(), OutputMode::Json).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to build dependency graph"));
        assert!(message.contains("unknown service 'api'"));
    }

    #[test]
    fn test_unknown_service_reports_context() {
        let app = app("db:\n");
        let args = ClosureArgs {
            names: vec!["ghost".to_string()],
        };

        let err = execute_ancestors(&app, &args, OutputMode::Json).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("dependencies of ghost"));
        assert!(message.contains("Service not found: ghost"));
    }
}
