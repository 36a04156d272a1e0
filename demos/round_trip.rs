use proxy_registry::config::{PersistConfig, ServerConfig};
use proxy_registry::server::{ServerLifecycleManager, ServerRegistry, StatusFlag};
use proxy_registry::{Error, Result};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let dir = tempfile::tempdir().map_err(|e| Error::Io(e.to_string()))?;
    let persist = PersistConfig::new(dir.path().join("persisted"));

    let registry = Arc::new(ServerRegistry::new());
    let manager = ServerLifecycleManager::new(Arc::clone(&registry), persist.clone());

    let config = ServerConfig::new("127.0.0.1", "MySQLBackend", 3306)
        .with_authenticator("MySQLBackendAuth", "");
    let id = registry.allocate("db-primary", config)?;
    registry.add_parameter(id, "weight", "10")?;
    registry.set_status(id, StatusFlag::Master)?;

    info!("Status: {}", registry.status_string(id)?);
    print!("{}", registry.report_all()?);

    let path = manager.persist(id)?;
    info!(path = ?path, "Persisted definition");

    // A second process would start from an empty registry
    let restarted = ServerLifecycleManager::new(Arc::new(ServerRegistry::new()), persist);
    let copy = restarted.reload(&path)?;
    let copy_path = dir.path().join("copy.cnf");
    restarted.serialize(copy, &copy_path)?;

    let original = std::fs::read(&path).map_err(|e| Error::Io(e.to_string()))?;
    let reloaded = std::fs::read(&copy_path).map_err(|e| Error::Io(e.to_string()))?;
    info!(identical = original == reloaded, "Round trip finished");

    let snapshot = restarted.registry().snapshot()?;
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| Error::Other(e.to_string()))?;
    println!("{}", json);

    Ok(())
}
