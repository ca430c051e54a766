//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;

use crate::domain::link_target;

/// Validate a service name given on the command line.
///
/// A `name:qualifier` reference is reduced to its name, matching how `links`
/// entries are read. Any other non-blank text is accepted as is, since the
/// compose document accepts any string as a service name.
pub fn validate_service_name(s: &str) -> Result<String, String> {
    let name = link_target(s);

    if name.trim().is_empty() {
        return Err("Service name cannot be empty".to_string());
    }

    Ok(name.to_string())
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Include services of this kind (repeatable)
    #[arg(short, long = "kind")]
    pub kinds: Vec<String>,

    /// Include the service with this name (repeatable, comma-separated)
    #[arg(short, long = "name", value_delimiter = ',', value_parser = validate_service_name)]
    pub names: Vec<String>,
}

/// Arguments for the `graph` command
#[derive(Parser, Debug, Clone, Default)]
pub struct GraphArgs {
    /// Print Graphviz DOT instead of an edge list
    #[arg(long)]
    pub dot: bool,
}

/// Arguments for the `ancestors` and `dependents` commands
#[derive(Parser, Debug, Clone)]
pub struct ClosureArgs {
    /// Services to start from
    #[arg(required = true, value_parser = validate_service_name)]
    pub names: Vec<String>,
}

/// Arguments for the `apps` command
#[derive(Parser, Debug, Clone, Default)]
pub struct AppsArgs {
    /// Applications to resolve (all services when omitted)
    #[arg(value_parser = validate_service_name)]
    pub names: Vec<String>,
}

/// Arguments for the `layout` command
#[derive(Parser, Debug, Clone, Default)]
pub struct LayoutArgs {}
