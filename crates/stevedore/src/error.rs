//! Error types for stevedore operations.

use std::io;
use thiserror::Error;

/// The error type for stevedore operations.
///
/// Every operation in the library is a deterministic computation over an
/// in-memory registry, so a given input always fails the same way and none of
/// these errors are retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The input document or one of its service records is malformed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A `links` entry names a service that is not in the registry.
    #[error("Service '{service}' links to unknown service '{dependency}'")]
    UnresolvedDependency {
        /// The service declaring the link
        service: String,
        /// The bare name it links to
        dependency: String,
    },

    /// A query named a service that is not in the registry.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for stevedore operations.
pub type Result<T> = std::result::Result<T, Error>;
