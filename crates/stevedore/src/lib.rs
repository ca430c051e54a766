//! Stevedore - dependency queries over compose-style service descriptions.
//!
//! This crate provides both a CLI application and a library for loading a
//! set of service records, building the graph of `links` between them, and
//! asking what a service or application transitively depends on.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod ancestry;
pub mod domain;
pub mod error;
pub mod graph;
pub mod query;
pub mod registry;
pub mod render;

// Loading and configuration
pub mod app;
pub mod config;

// Public CLI module (needed by binary)
pub mod cli;
pub mod output;
