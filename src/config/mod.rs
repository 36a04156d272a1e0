//! Configuration module for the proxy registry.
//!
//! This module owns the section based text format servers are persisted in,
//! the definition a server is built from, and the settings that control where
//! persisted definitions are written.
//!
//! # File format
//!
//! ```text
//! # comment
//! [db-primary]
//! address=10.0.0.5
//! protocol=MySQLBackend
//! port=3306
//! authenticator=MySQLBackendAuth
//! authenticator_options=
//! weight=10
//! ```
//!
//! # Examples
//!
//! Parsing a file and inspecting the first section:
//!
//! ```no_run
//! use proxy_registry::config::parse_file;
//!
//! let contexts = parse_file("servers.cnf").unwrap();
//! println!("First section: {}", contexts[0].name());
//! ```
//!
//! Describing a server programmatically:
//!
//! ```
//! use proxy_registry::config::ServerConfig;
//!
//! let config = ServerConfig::new("127.0.0.1", "MySQLBackend", 3306)
//!     .with_authenticator("MySQLBackendAuth", "");
//! assert_eq!(config.port, 3306);
//! ```
mod parameters;
mod parser;
pub mod validator;
mod writer;

pub use parameters::ParameterList;
pub use parser::{ConfigContext, DuplicateContext, parse_file, parse_file_with, parse_files, parse_str};
pub use validator::{validate_parameter, validate_server_config, validate_unique_name};
pub use writer::{render_server, serialize_server};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Key holding the connectable host
pub const KEY_ADDRESS: &str = "address";
/// Key holding the wire protocol module
pub const KEY_PROTOCOL: &str = "protocol";
/// Key holding the port
pub const KEY_PORT: &str = "port";
/// Key holding the authenticator module
pub const KEY_AUTHENTICATOR: &str = "authenticator";
/// Key holding the opaque authenticator options
pub const KEY_AUTHENTICATOR_OPTIONS: &str = "authenticator_options";

/// Keys with a fixed meaning; everything else is a generic parameter.
pub const RESERVED_KEYS: [&str; 5] = [
    KEY_ADDRESS,
    KEY_PROTOCOL,
    KEY_PORT,
    KEY_AUTHENTICATOR,
    KEY_AUTHENTICATOR_OPTIONS,
];

/// Definition of a single backend server.
///
/// This is the input to [`ServerRegistry::allocate`](crate::server::ServerRegistry::allocate).
/// The port is kept wide here so that out of range values coming from text
/// can be reported instead of silently truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host the proxy connects to
    pub address: String,
    /// Wire protocol module identifier
    pub protocol: String,
    /// TCP port, 0-65535
    pub port: u32,
    /// Authenticator module identifier, may be empty
    pub authenticator: String,
    /// Options handed verbatim to the authenticator
    pub authenticator_options: String,
    /// Extra settings in the order they were given
    pub parameters: ParameterList,
}

impl ServerConfig {
    /// Create a definition with no authenticator and no extra parameters
    pub fn new(address: impl Into<String>, protocol: impl Into<String>, port: u32) -> Self {
        Self {
            address: address.into(),
            protocol: protocol.into(),
            port,
            ..Self::default()
        }
    }

    /// Set the authenticator module and its options
    pub fn with_authenticator(
        mut self,
        authenticator: impl Into<String>,
        options: impl Into<String>,
    ) -> Self {
        self.authenticator = authenticator.into();
        self.authenticator_options = options.into();
        self
    }
}

/// Settings for persisting server definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Directory receiving one `<unique_name>.cnf` file per server
    pub directory: PathBuf,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("persisted"),
        }
    }
}

impl PersistConfig {
    /// Create settings writing into `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Parses persistence settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid JSON or does not match
    /// the expected shape.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::Parse(format!("Failed to parse JSON persist config: {}", e)))
    }

    /// File a server with the given unique name is persisted to
    pub fn path_for(&self, unique_name: &str) -> PathBuf {
        self.directory.join(format!("{}.cnf", unique_name))
    }

    /// Directory as a path
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_config_from_json() {
        let config = PersistConfig::from_json_str(r#"{ "directory": "/var/lib/proxy" }"#).unwrap();
        assert_eq!(config.directory(), Path::new("/var/lib/proxy"));
        assert_eq!(
            config.path_for("db1"),
            PathBuf::from("/var/lib/proxy/db1.cnf")
        );

        let defaulted = PersistConfig::from_json_str("{}").unwrap();
        assert_eq!(defaulted, PersistConfig::default());

        assert!(PersistConfig::from_json_str("not json").is_err());
    }
}
