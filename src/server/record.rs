use crate::config::{ParameterList, ServerConfig};
use crate::server::ServerStatus;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Handle identifying one registry entry.
///
/// Handles stay the same across renames and are never reused, so a handle
/// kept after `free` simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ServerId(Uuid);

impl ServerId {
    // Only the registry hands out ids
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A backend server definition held by the registry.
///
/// Values of this type handed out by the registry are snapshots; changing
/// a server goes through [`ServerRegistry`](crate::server::ServerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Server {
    id: ServerId,
    unique_name: String,
    address: String,
    protocol: String,
    port: u16,
    authenticator: String,
    authenticator_options: String,
    status: ServerStatus,
    parameters: ParameterList,
    #[serde(skip)]
    renamed: bool,
}

impl Server {
    /// Build an entry from an already validated definition
    pub(crate) fn from_config(name: &str, config: ServerConfig, port: u16) -> Self {
        Self {
            id: ServerId::new(),
            unique_name: name.to_string(),
            address: config.address,
            protocol: config.protocol,
            port,
            authenticator: config.authenticator,
            authenticator_options: config.authenticator_options,
            status: ServerStatus::default(),
            parameters: config.parameters,
            renamed: false,
        }
    }

    /// Registry handle
    pub fn id(&self) -> ServerId {
        self.id
    }

    /// Registry key
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Host the proxy connects to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Wire protocol module identifier
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// TCP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Authenticator module identifier
    pub fn authenticator(&self) -> &str {
        &self.authenticator
    }

    /// Options passed through to the authenticator
    pub fn authenticator_options(&self) -> &str {
        &self.authenticator_options
    }

    /// Current status flags
    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Extra parameters in insertion order
    pub fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    /// Whether the fields that make up the persisted definition match.
    ///
    /// Handle, status and parameters are not compared.
    pub fn same_definition(&self, other: &Server) -> bool {
        self.unique_name == other.unique_name
            && self.address == other.address
            && self.protocol == other.protocol
            && self.port == other.port
            && self.authenticator == other.authenticator
            && self.authenticator_options == other.authenticator_options
    }

    pub(crate) fn status_mut(&mut self) -> &mut ServerStatus {
        &mut self.status
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut ParameterList {
        &mut self.parameters
    }

    pub(crate) fn set_address(&mut self, address: String) {
        self.address = address;
    }

    pub(crate) fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub(crate) fn has_been_renamed(&self) -> bool {
        self.renamed
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.unique_name = name;
        self.renamed = true;
    }
}

impl fmt::Display for Server {
    /// Multi-line diagnostic report
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Server {}", self.unique_name)?;
        writeln!(f, "\tServer:                  {}", self.address)?;
        writeln!(f, "\tStatus:                  {}", self.status)?;
        writeln!(f, "\tProtocol:                {}", self.protocol)?;
        writeln!(f, "\tPort:                    {}", self.port)?;
        writeln!(f, "\tAuthenticator:           {}", self.authenticator)?;
        for (key, value) in self.parameters.iter() {
            writeln!(f, "\t{:<24} {}", format!("{}:", key), value)?;
        }
        Ok(())
    }
}
