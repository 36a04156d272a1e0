//! Server management module for the proxy registry.
//!
//! This module holds the registry of backend server definitions, their
//! status flags, and the lifecycle manager that builds servers from
//! configuration and writes them back out. Lifecycle operations are
//! instrumented with `tracing` spans.
//!
//! # Components
//!
//! * `status` - Status flags and their canonical textual form
//! * `registry` - The shared, lock protected collection of servers
//! * `lifecycle` - Creation from parsed configuration, persistence and reload
//!
//! # Examples
//!
//! Creating a server and persisting it:
//!
//! ```no_run
//! use proxy_registry::config::{PersistConfig, ServerConfig};
//! use proxy_registry::server::{ServerLifecycleManager, ServerRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ServerRegistry::new());
//! let manager = ServerLifecycleManager::new(
//!     Arc::clone(&registry),
//!     PersistConfig::new("/var/lib/proxy/servers"),
//! );
//!
//! let config = ServerConfig::new("10.0.0.5", "MySQLBackend", 3306)
//!     .with_authenticator("MySQLBackendAuth", "");
//! let id = registry.allocate("db1", config).unwrap();
//! let path = manager.persist(id).unwrap();
//! println!("Wrote {}", path.display());
//! ```
//!
//! Reloading a persisted server into a fresh registry:
//!
//! ```no_run
//! use proxy_registry::config::PersistConfig;
//! use proxy_registry::server::{ServerLifecycleManager, ServerRegistry};
//! use std::sync::Arc;
//!
//! let manager = ServerLifecycleManager::new(
//!     Arc::new(ServerRegistry::new()),
//!     PersistConfig::default(),
//! );
//! let id = manager.reload("persisted/db1.cnf").unwrap();
//! println!("{}", manager.registry().report(id).unwrap());
//! ```
pub mod lifecycle;
mod record;
pub mod registry;
pub mod status;

pub use lifecycle::{ServerEvent, ServerLifecycleEvent, ServerLifecycleManager};
pub use record::{Server, ServerId};
pub use registry::ServerRegistry;
pub use status::{ServerStatus, StatusFlag};
