//! The process-wide collection of server definitions.
//!
//! One readers-writer lock guards both membership and the mutable fields of
//! every entry. Lookups, iteration and status rendering take the shared lock;
//! allocation, removal, renames and field updates take the exclusive one. No
//! file I/O happens while the lock is held.

use crate::config::validator::validate_value;
use crate::config::{ServerConfig, validate_parameter, validate_server_config, validate_unique_name};
use crate::error::{Error, Result};
use crate::server::{Server, ServerId, ServerStatus, StatusFlag};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of backend servers keyed by unique name.
///
/// Entries keep their insertion order, which is the order [`for_each`]
/// visits them in.
///
/// [`for_each`]: ServerRegistry::for_each
///
/// # Examples
///
/// ```
/// use proxy_registry::config::ServerConfig;
/// use proxy_registry::server::{ServerRegistry, StatusFlag};
///
/// let registry = ServerRegistry::new();
/// let config = ServerConfig::new("10.0.0.5", "MySQLBackend", 3306);
/// let id = registry.allocate("db1", config).unwrap();
///
/// registry.set_status(id, StatusFlag::Master).unwrap();
/// assert_eq!(registry.status_string(id).unwrap(), "Master, Running");
/// assert_eq!(registry.find_by_unique_name("db1").unwrap(), Some(id));
/// ```
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: RwLock<Vec<Server>>,
}

impl ServerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Server>>> {
        self.servers
            .read()
            .map_err(|_| Error::Other("Failed to lock server registry".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Server>>> {
        self.servers
            .write()
            .map_err(|_| Error::Other("Failed to lock server registry".to_string()))
    }

    fn with_server<T>(&self, id: ServerId, f: impl FnOnce(&Server) -> T) -> Result<T> {
        let servers = self.read()?;
        servers
            .iter()
            .find(|s| s.id() == id)
            .map(f)
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))
    }

    fn with_server_mut<T>(
        &self,
        id: ServerId,
        f: impl FnOnce(&mut Server) -> Result<T>,
    ) -> Result<T> {
        let mut servers = self.write()?;
        let server = servers
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))?;
        f(server)
    }

    /// Allocate a server and register it under `name`.
    ///
    /// The new server starts out `Running`.
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`] if the definition is incomplete or malformed
    /// * [`Error::Collision`] if `name` is already registered
    pub fn allocate(&self, name: &str, config: ServerConfig) -> Result<ServerId> {
        validate_server_config(name, &config).inspect_err(|e| {
            tracing::warn!(server = %name, error = %e, "Rejected server definition");
        })?;
        let port = u16::try_from(config.port)
            .map_err(|_| Error::Validation(format!("Server '{}' has invalid port", name)))?;
        let server = Server::from_config(name, config, port);
        let id = server.id();

        let mut servers = self.write()?;
        if servers.iter().any(|s| s.unique_name() == name) {
            tracing::warn!(server = %name, "Unique name already registered");
            return Err(Error::Collision(name.to_string()));
        }
        tracing::info!(
            server = %name,
            server_id = %id,
            address = %server.address(),
            port = server.port(),
            "Allocated server"
        );
        servers.push(server);
        Ok(id)
    }

    /// Look up a server by unique name
    pub fn find_by_unique_name(&self, name: &str) -> Result<Option<ServerId>> {
        let servers = self.read()?;
        Ok(servers
            .iter()
            .find(|s| s.unique_name() == name)
            .map(Server::id))
    }

    /// Look up the first server with the given address and port
    pub fn find_by_address(&self, address: &str, port: u16) -> Result<Option<ServerId>> {
        let servers = self.read()?;
        Ok(servers
            .iter()
            .find(|s| s.address() == address && s.port() == port)
            .map(Server::id))
    }

    /// Snapshot of a single server
    pub fn get(&self, id: ServerId) -> Result<Server> {
        self.with_server(id, Server::clone)
    }

    /// Whether `id` is currently registered
    pub fn contains(&self, id: ServerId) -> Result<bool> {
        let servers = self.read()?;
        Ok(servers.iter().any(|s| s.id() == id))
    }

    /// Give a server its final unique name.
    ///
    /// A server may be renamed once after allocation. Renaming to the name
    /// it already has succeeds without counting as the rename.
    ///
    /// # Errors
    ///
    /// * [`Error::Collision`] if another server holds `name`
    /// * [`Error::Validation`] if the server was already renamed or `name`
    ///   cannot be written as a section header
    /// * [`Error::ServerNotFound`] if `id` is not registered
    pub fn set_unique_name(&self, id: ServerId, name: &str) -> Result<()> {
        validate_unique_name(name)?;

        let mut servers = self.write()?;
        if servers.iter().any(|s| s.unique_name() == name && s.id() != id) {
            tracing::warn!(server = %name, server_id = %id, "Rename collides with another server");
            return Err(Error::Collision(name.to_string()));
        }

        let server = servers
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))?;
        if server.unique_name() == name {
            return Ok(());
        }
        if server.has_been_renamed() {
            return Err(Error::Validation(format!(
                "Server '{}' has already been given its unique name",
                server.unique_name()
            )));
        }

        tracing::info!(from = %server.unique_name(), to = %name, "Renamed server");
        server.rename(name.to_string());
        Ok(())
    }

    /// Remove a server from the registry, returning its last state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerNotFound`] if the server is not registered,
    /// which includes freeing the same server twice.
    pub fn free(&self, id: ServerId) -> Result<Server> {
        let mut servers = self.write()?;
        let index = servers
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| {
                tracing::warn!(server_id = %id, "Attempted to free unregistered server");
                Error::ServerNotFound(id.to_string())
            })?;
        let server = servers.remove(index);
        tracing::info!(server = %server.unique_name(), server_id = %id, "Freed server");
        Ok(server)
    }

    /// Visit every server in insertion order.
    ///
    /// The shared lock is held for the whole walk, so `visitor` must not call
    /// back into mutating registry methods.
    pub fn for_each(&self, mut visitor: impl FnMut(&Server)) -> Result<()> {
        let servers = self.read()?;
        servers.iter().for_each(|s| visitor(s));
        Ok(())
    }

    /// Snapshot of all servers in insertion order
    pub fn snapshot(&self) -> Result<Vec<Server>> {
        Ok(self.read()?.clone())
    }

    /// Handles of all servers in insertion order
    pub fn ids(&self) -> Result<Vec<ServerId>> {
        Ok(self.read()?.iter().map(Server::id).collect())
    }

    /// Number of registered servers
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Add an extra parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the key is reserved, malformed or
    /// already present on the server.
    pub fn add_parameter(&self, id: ServerId, key: &str, value: &str) -> Result<()> {
        validate_parameter(key, value)?;
        self.with_server_mut(id, |server| {
            server.parameters_mut().add(key, value).map_err(|_| {
                Error::Validation(format!(
                    "Server '{}' already has parameter '{}'",
                    server.unique_name(),
                    key
                ))
            })
        })
    }

    /// Set a parameter, replacing the value in place if the key exists
    pub fn update_parameter(&self, id: ServerId, key: &str, value: &str) -> Result<()> {
        validate_parameter(key, value)?;
        self.with_server_mut(id, |server| {
            let params = server.parameters_mut();
            if !params.update(key, value) {
                params.add(key, value)?;
            }
            Ok(())
        })
    }

    /// Value of an extra parameter
    pub fn get_parameter(&self, id: ServerId, key: &str) -> Result<Option<String>> {
        self.with_server(id, |server| server.parameters().get(key).map(str::to_string))
    }

    /// Change the address
    pub fn update_address(&self, id: ServerId, address: &str) -> Result<()> {
        if address.trim().is_empty() {
            return Err(Error::Validation("Address is empty".to_string()));
        }
        validate_value("address", address)?;
        self.with_server_mut(id, |server| {
            tracing::info!(server = %server.unique_name(), address = %address, "Updated server address");
            server.set_address(address.to_string());
            Ok(())
        })
    }

    /// Change the port
    pub fn update_port(&self, id: ServerId, port: u32) -> Result<()> {
        let port = u16::try_from(port)
            .map_err(|_| Error::Validation(format!("Port {} outside 0-65535", port)))?;
        self.with_server_mut(id, |server| {
            tracing::info!(server = %server.unique_name(), port, "Updated server port");
            server.set_port(port);
            Ok(())
        })
    }

    /// Set one status flag
    pub fn set_status(&self, id: ServerId, flag: StatusFlag) -> Result<()> {
        self.with_server_mut(id, |server| {
            server.status_mut().set(flag);
            Ok(())
        })
    }

    /// Clear one status flag
    pub fn clear_status(&self, id: ServerId, flag: StatusFlag) -> Result<()> {
        self.with_server_mut(id, |server| {
            server.status_mut().clear(flag);
            Ok(())
        })
    }

    /// Replace the whole status mask
    pub fn set_status_bits(&self, id: ServerId, status: ServerStatus) -> Result<()> {
        self.with_server_mut(id, |server| {
            *server.status_mut() = status;
            Ok(())
        })
    }

    /// Current status flags
    pub fn status(&self, id: ServerId) -> Result<ServerStatus> {
        self.with_server(id, Server::status)
    }

    /// Current status in textual form, e.g. `"Master, Running"`
    pub fn status_string(&self, id: ServerId) -> Result<String> {
        self.with_server(id, |server| server.status().to_string())
    }

    /// Diagnostic report for one server
    pub fn report(&self, id: ServerId) -> Result<String> {
        self.with_server(id, Server::to_string)
    }

    /// Diagnostic report for every server, in insertion order
    pub fn report_all(&self) -> Result<String> {
        let mut out = String::new();
        self.for_each(|server| out.push_str(&server.to_string()))?;
        Ok(out)
    }
}
