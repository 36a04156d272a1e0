/// Error handling module for the proxy registry.
///
/// This module defines the error types used throughout the library.
/// Every fallible operation on the registry, the configuration text format
/// and the lifecycle manager returns one of these variants together with a
/// context string describing what went wrong.
///
/// # Example
///
/// ```
/// use proxy_registry::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::Collision(name)) => println!("Name '{}' is already taken", name),
///         Err(Error::Parse(msg)) => println!("Bad configuration: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the proxy-registry library.
#[derive(Error, Debug)]
pub enum Error {
    /// A server definition is malformed or incomplete.
    ///
    /// This error occurs when:
    /// - The address or protocol is empty
    /// - The port is non-numeric or outside 0-65535
    /// - A required configuration key is missing
    /// - A parameter key or value cannot be represented in the text format
    #[error("Validation error: {0}")]
    Validation(String),

    /// A unique name is already held by another server.
    #[error("Unique name collision: {0}")]
    Collision(String),

    /// Configuration text could not be parsed.
    ///
    /// This error occurs when:
    /// - A line is neither a section header, a comment nor `key=value`
    /// - A `key=value` line appears before any section header
    /// - Two sections share a name within one parse pass
    /// - A key repeats inside one section
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration file could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// The server handle does not denote a registered server.
    ///
    /// This is also the result of freeing a server twice.
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// Any other error not covered by the above categories.
    ///
    /// Currently only produced when a lock has been poisoned.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for proxy-registry operations.
pub type Result<T> = std::result::Result<T, Error>;
