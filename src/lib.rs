/*!
 # Proxy Registry

 Server registry and configuration persistence for a database proxy runtime.

 ## Overview

 Proxy Registry provides functionality to:
 - Hold the authoritative list of backend server definitions
 - Track each server's status flags and render them as text
 - Attach ordered extra parameters to servers
 - Parse section based configuration files into server definitions
 - Write a server back out so that reloading it reproduces the same file

 ## Basic Usage

 ```no_run
 use proxy_registry::{Result, ServerLifecycleManager, ServerRegistry};
 use proxy_registry::config::{PersistConfig, ServerConfig};
 use proxy_registry::server::StatusFlag;
 use std::sync::Arc;

 fn main() -> Result<()> {
     let registry = Arc::new(ServerRegistry::new());
     let manager = ServerLifecycleManager::new(
         Arc::clone(&registry),
         PersistConfig::new("persisted"),
     );

     // Create every server defined in the main configuration file
     let ids = manager.load(&["servers.cnf"])?;

     // Promote the first one
     registry.set_status(ids[0], StatusFlag::Master)?;
     println!("{}", registry.report_all()?);

     // Write it to persisted/<name>.cnf
     manager.persist(ids[0])?;

     Ok(())
 }
 ```

 ## Features

 - **Registry**: Concurrent lookup, iteration and mutation behind one readers-writer lock
 - **Status**: Fixed flag set with deterministic rendering and permissive parsing
 - **Configuration**: `[section]` / `key=value` files with duplicate detection
 - **Persistence**: Atomic, byte-for-byte reproducible server files
 - **Error Handling**: One error type covering validation, collisions, parsing and I/O
*/

pub mod config;
pub mod error;
pub mod server;

pub use config::{ParameterList, ServerConfig};
pub use error::{Error, Result};
pub use server::{Server, ServerId, ServerLifecycleManager, ServerRegistry, ServerStatus, StatusFlag};
