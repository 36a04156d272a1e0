use crate::config::{
    ConfigContext, KEY_ADDRESS, KEY_AUTHENTICATOR, KEY_AUTHENTICATOR_OPTIONS, KEY_PORT,
    KEY_PROTOCOL, PersistConfig, RESERVED_KEYS, ServerConfig, parse_file, parse_files,
    serialize_server,
};
use crate::error::{Error, Result};
use crate::server::{Server, ServerId, ServerRegistry};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

const MAX_EVENTS: usize = 1000;

/// Server lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerLifecycleEvent {
    /// Server created from configuration
    Created,
    /// Server given its unique name
    Renamed,
    /// Server removed from the registry
    Freed,
    /// Server definition written to disk
    Persisted,
    /// Server recreated from a persisted file
    Reloaded,
}

/// Server lifecycle event
#[derive(Debug, Clone)]
pub struct ServerEvent {
    /// Server ID
    pub id: ServerId,
    /// Unique name at the time of the event
    pub name: String,
    /// Event type
    pub event: ServerLifecycleEvent,
    /// Event timestamp
    pub timestamp: Instant,
    /// Event details
    pub details: Option<String>,
}

/// Drives configuration based creation of servers and their persistence.
///
/// Parsing and file writes happen outside the registry lock; the registry is
/// only touched to insert a finished server or to take a snapshot of one.
pub struct ServerLifecycleManager {
    registry: Arc<ServerRegistry>,
    persist: PersistConfig,
    events: Arc<Mutex<Vec<ServerEvent>>>,
}

impl ServerLifecycleManager {
    /// Create a lifecycle manager operating on `registry`
    pub fn new(registry: Arc<ServerRegistry>, persist: PersistConfig) -> Self {
        Self {
            registry,
            persist,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The registry servers are created in
    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    /// Persistence settings
    pub fn persist_config(&self) -> &PersistConfig {
        &self.persist
    }

    /// Create and register a server from one parsed section.
    ///
    /// The section name becomes the unique name. Keys other than the fixed
    /// server keys become extra parameters in file order.
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`] if a required key is missing, the port is not
    ///   a number, or the definition is otherwise invalid
    /// * [`Error::Collision`] if the section name is already registered
    ///
    /// Nothing is registered when an error is returned.
    #[tracing::instrument(skip(self, context), fields(server = %context.name()))]
    pub fn create_from_context(&self, context: &ConfigContext) -> Result<ServerId> {
        let name = context.name();
        let required = |key: &str| {
            context.get(key).ok_or_else(|| {
                tracing::warn!(key = %key, "Missing required server parameter");
                Error::Validation(format!(
                    "Server '{}' is missing required parameter '{}'",
                    name, key
                ))
            })
        };

        let address = required(KEY_ADDRESS)?;
        let protocol = required(KEY_PROTOCOL)?;
        let port_text = required(KEY_PORT)?;
        let authenticator = required(KEY_AUTHENTICATOR)?;
        let authenticator_options = required(KEY_AUTHENTICATOR_OPTIONS)?;

        let port = port_text.parse::<u32>().map_err(|_| {
            tracing::warn!(port = %port_text, "Non-numeric server port");
            Error::Validation(format!(
                "Server '{}' has non-numeric port '{}'",
                name, port_text
            ))
        })?;

        let mut config = ServerConfig::new(address, protocol, port)
            .with_authenticator(authenticator, authenticator_options);
        for (key, value) in context
            .parameters()
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(key))
        {
            config.parameters.add(key, value)?;
        }

        let id = self.registry.allocate(name, config)?;
        if let Err(e) = self.record_event(id, name, ServerLifecycleEvent::Created, None) {
            if let Err(free_err) = self.registry.free(id) {
                tracing::warn!(server_id = %id, error = %free_err, "Failed to free unrecorded server");
            }
            return Err(e);
        }
        Ok(id)
    }

    /// Recreate a server from a file holding exactly one section.
    ///
    /// # Errors
    ///
    /// * [`Error::Io`] or [`Error::Parse`] if the file cannot be read or parsed
    /// * [`Error::Parse`] if the file holds no section or more than one
    /// * any error of [`create_from_context`](Self::create_from_context)
    #[tracing::instrument(skip(self, path), fields(path = ?path.as_ref()))]
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<ServerId> {
        let path = path.as_ref();
        let contexts = parse_file(path)?;
        let [context] = contexts.as_slice() else {
            tracing::error!(sections = contexts.len(), "Expected a single server section");
            return Err(Error::Parse(format!(
                "'{}' holds {} sections, expected exactly one",
                path.display(),
                contexts.len()
            )));
        };

        let id = self.create_from_context(context)?;
        self.record_event(
            id,
            context.name(),
            ServerLifecycleEvent::Reloaded,
            Some(path.display().to_string()),
        )?;
        tracing::info!(server = %context.name(), "Reloaded server from file");
        Ok(id)
    }

    /// Create every server defined across `paths`.
    ///
    /// All files share one duplicate check, so a section name may appear
    /// only once over the whole set.
    ///
    /// # Errors
    ///
    /// Fails on the first parse or creation error. Servers created earlier in
    /// the same call are freed again before the error is returned.
    #[tracing::instrument(skip(self, paths), fields(files = paths.len()))]
    pub fn load<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<ServerId>> {
        let contexts = parse_files(paths)?;

        let mut created = Vec::with_capacity(contexts.len());
        for context in &contexts {
            match self.create_from_context(context) {
                Ok(id) => created.push(id),
                Err(e) => {
                    tracing::error!(error = %e, rolled_back = created.len(), "Failed to load servers");
                    for id in created {
                        if let Err(free_err) = self.destroy(id) {
                            tracing::warn!(server_id = %id, error = %free_err, "Rollback failed");
                        }
                    }
                    return Err(e);
                }
            }
        }

        tracing::info!(servers = created.len(), "Loaded servers");
        Ok(created)
    }

    /// Write a server's definition to `path`.
    ///
    /// # Errors
    ///
    /// [`Error::ServerNotFound`] for an unknown handle, [`Error::Io`] if the
    /// file cannot be written.
    pub fn serialize(&self, id: ServerId, path: impl AsRef<Path>) -> Result<()> {
        let server = self.registry.get(id)?;
        serialize_server(&server, path)
    }

    /// Write a server's definition into the persistence directory.
    ///
    /// Returns the path written, `<directory>/<unique_name>.cnf`.
    #[tracing::instrument(skip(self))]
    pub fn persist(&self, id: ServerId) -> Result<PathBuf> {
        let server = self.registry.get(id)?;
        let directory = self.persist.directory();
        std::fs::create_dir_all(directory).map_err(|e| {
            tracing::error!(directory = ?directory, error = %e, "Failed to create persist directory");
            Error::Io(format!(
                "Failed to create directory '{}': {}",
                directory.display(),
                e
            ))
        })?;

        let path = self.persist.path_for(server.unique_name());
        serialize_server(&server, &path)?;
        self.record_event(
            id,
            server.unique_name(),
            ServerLifecycleEvent::Persisted,
            Some(path.display().to_string()),
        )?;
        tracing::info!(server = %server.unique_name(), path = ?path, "Persisted server");
        Ok(path)
    }

    /// Rename a server and record the event
    pub fn rename(&self, id: ServerId, name: &str) -> Result<()> {
        self.registry.set_unique_name(id, name)?;
        self.record_event(id, name, ServerLifecycleEvent::Renamed, None)
    }

    /// Free a server and record the event
    pub fn destroy(&self, id: ServerId) -> Result<Server> {
        let server = self.registry.free(id)?;
        self.record_event(id, server.unique_name(), ServerLifecycleEvent::Freed, None)?;
        Ok(server)
    }

    fn record_event(
        &self,
        id: ServerId,
        name: &str,
        event: ServerLifecycleEvent,
        details: Option<String>,
    ) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| Error::Other("Failed to lock server events".to_string()))?;

        events.push(ServerEvent {
            id,
            name: name.to_string(),
            event,
            timestamp: Instant::now(),
            details,
        });

        // Limit event history
        if events.len() > MAX_EVENTS {
            events.remove(0);
        }

        Ok(())
    }

    /// Get recent events for a server, newest first
    pub fn get_server_events(&self, id: ServerId, limit: Option<usize>) -> Result<Vec<ServerEvent>> {
        let events = self
            .events
            .lock()
            .map_err(|_| Error::Other("Failed to lock server events".to_string()))?;

        let mut server_events: Vec<ServerEvent> =
            events.iter().rev().filter(|e| e.id == id).cloned().collect();

        if let Some(limit) = limit {
            server_events.truncate(limit);
        }

        Ok(server_events)
    }

    /// Get all events, newest first
    pub fn get_all_events(&self, limit: Option<usize>) -> Result<Vec<ServerEvent>> {
        let events = self
            .events
            .lock()
            .map_err(|_| Error::Other("Failed to lock server events".to_string()))?;

        let mut all_events: Vec<ServerEvent> = events.iter().rev().cloned().collect();

        if let Some(limit) = limit {
            all_events.truncate(limit);
        }

        Ok(all_events)
    }
}
