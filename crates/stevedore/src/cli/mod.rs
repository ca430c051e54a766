//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for stevedore using clap's
//! derive API.
//!
//! # Commands
//!
//! - `list`: List services, optionally filtered by kind or name
//! - `graph`: Print the dependency graph as an edge list or DOT
//! - `ancestors`: Show everything the given services depend on
//! - `dependents`: Show everything that depends on the given services
//! - `apps`: Show everything the given applications depend on
//! - `layout`: Show display attributes and positions for every node
//!
//! # Global Flags
//!
//! - `--file`: Compose file to read
//! - `--config`: Configuration file to use instead of searching for one
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! stevedore list --kind application --kind perf
//! stevedore ancestors web
//! stevedore apps shop jobs
//! stevedore graph --dot | dot -Tsvg > graph.svg
//! ```

mod args;
mod execute;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Re-export argument structs
pub use args::{AppsArgs, ClosureArgs, GraphArgs, LayoutArgs, ListArgs, validate_service_name};

/// Stevedore - dependency queries for compose-style service descriptions
///
/// Reads a compose file, builds the graph of `links` between services, and
/// answers what a service or application transitively depends on.
#[derive(Parser, Debug)]
#[command(name = "stevedore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Compose file to read (default: from stevedore.yaml, else docker-compose.yml)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Configuration file (default: nearest stevedore.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List services
    ///
    /// Shows the services matching any of the given filters. With no
    /// filters, shows every service.
    List(ListArgs),

    /// Print the dependency graph
    ///
    /// One `dependency -> dependent` line per link, or Graphviz DOT with
    /// `--dot`.
    Graph(GraphArgs),

    /// Show everything the given services depend on
    ///
    /// Follows links transitively. The given services are only listed if
    /// one of them depends on another.
    Ancestors(ClosureArgs),

    /// Show everything that depends on the given services
    ///
    /// Follows links transitively in the reverse direction.
    Dependents(ClosureArgs),

    /// Show everything the given applications depend on
    ///
    /// Only services of type `application` are resolved; other names are
    /// skipped with a warning. With no names, shows every service.
    Apps(AppsArgs),

    /// Show display attributes and positions for every node
    Layout(LayoutArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns an error if loading the compose file or running the command
    /// fails.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::{App, LoadOptions};
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Stevedore service dependency explorer");
            println!("Use --help for more information");
            return Ok(());
        };

        let options = LoadOptions {
            compose_file: self.file.clone(),
            config_file: self.config.clone(),
        };
        let app = App::load(&std::env::current_dir()?, &options).await?;

        match command {
            Commands::List(args) => execute::execute_list(&app, args, output_mode),
            Commands::Graph(args) => execute::execute_graph(&app, args, output_mode),
            Commands::Ancestors(args) => execute::execute_ancestors(&app, args, output_mode),
            Commands::Dependents(args) => execute::execute_dependents(&app, args, output_mode),
            Commands::Apps(args) => execute::execute_apps(&app, args, output_mode),
            Commands::Layout(args) => execute::execute_layout(&app, args, output_mode),
        }
    }
}
