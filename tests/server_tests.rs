use proxy_registry::config::ServerConfig;
use proxy_registry::error::{Error, Result};
use proxy_registry::server::{ServerRegistry, ServerStatus, StatusFlag};

#[test]
fn test_server_basics() -> Result<()> {
    let registry = ServerRegistry::new();

    // Allocate a server
    let config = ServerConfig::new("HTTPD", "MySQLBackend", 9876)
        .with_authenticator("NullAuthAllow", "");
    let server = registry.allocate("MyServer", config)?;

    // Parameters
    assert_eq!(registry.get_parameter(server, "name")?, None);
    registry.add_parameter(server, "name", "value")?;
    assert_eq!(registry.get_parameter(server, "name")?.as_deref(), Some("value"));

    // Unique name
    assert_eq!(registry.find_by_unique_name("uniquename")?, None);
    registry.set_unique_name(server, "uniquename")?;
    assert_eq!(registry.find_by_unique_name("uniquename")?, Some(server));

    // Status
    assert_eq!(registry.status_string(server)?, "Running");
    registry.set_status(server, StatusFlag::Master)?;
    assert_eq!(registry.status_string(server)?, "Master, Running");
    registry.clear_status(server, StatusFlag::Master)?;
    assert_eq!(registry.status_string(server)?, "Running");

    // Reports
    let report = registry.report(server)?;
    assert!(report.starts_with("Server uniquename\n"));
    assert!(report.contains("Status:                  Running"));
    assert!(report.contains("name:"));
    assert_eq!(registry.report_all()?, report);

    // Free exactly once
    registry.free(server)?;
    assert!(matches!(registry.free(server), Err(Error::ServerNotFound(_))));
    assert_eq!(registry.find_by_unique_name("uniquename")?, None);

    Ok(())
}

#[test]
fn test_for_each_visits_in_insertion_order() -> Result<()> {
    let registry = ServerRegistry::new();
    for name in ["charlie", "alpha", "bravo"] {
        registry.allocate(name, ServerConfig::new("127.0.0.1", "MySQLBackend", 3306))?;
    }

    let mut names = Vec::new();
    registry.for_each(|server| names.push(server.unique_name().to_string()))?;
    assert_eq!(names, vec!["charlie", "alpha", "bravo"]);

    let ids = registry.ids()?;
    registry.free(ids[1])?;
    let remaining: Vec<String> = registry
        .snapshot()?
        .iter()
        .map(|s| s.unique_name().to_string())
        .collect();
    assert_eq!(remaining, vec!["charlie", "bravo"]);

    Ok(())
}

#[test]
fn test_status_set_then_clear_restores_string() -> Result<()> {
    let registry = ServerRegistry::new();
    let id = registry.allocate("db1", ServerConfig::new("127.0.0.1", "MySQLBackend", 3306))?;

    let flags = std::iter::once(StatusFlag::Running).chain(StatusFlag::RENDER_ORDER);
    for flag in flags {
        let before = registry.status(id)?;
        let text_before = registry.status_string(id)?;

        if before.contains(flag) {
            registry.clear_status(id, flag)?;
            registry.set_status(id, flag)?;
        } else {
            registry.set_status(id, flag)?;
            assert_ne!(registry.status_string(id)?, text_before);
            registry.clear_status(id, flag)?;
        }

        assert_eq!(registry.status(id)?, before);
        assert_eq!(registry.status_string(id)?, text_before);
    }

    Ok(())
}

#[test]
fn test_status_textual_round_trip_is_stable() -> Result<()> {
    let registry = ServerRegistry::new();
    let id = registry.allocate("db1", ServerConfig::new("127.0.0.1", "MySQLBackend", 3306))?;

    registry.set_status_bits(id, ServerStatus::parse("Slave, Stale Status, Down"))?;
    let text = registry.status_string(id)?;
    assert_eq!(text, "Slave, Stale Status, Down");
    assert_eq!(ServerStatus::parse(&text).to_string(), text);

    // Unknown tokens are dropped, known ones survive
    let parsed = ServerStatus::parse("Relay Master, Future Flag, Running");
    assert_eq!(parsed.to_string(), "Relay Master, Running");
    assert_eq!(ServerStatus::parse(&parsed.to_string()), parsed);

    Ok(())
}

#[test]
fn test_server_info_serializes_to_json() -> Result<()> {
    let registry = ServerRegistry::new();
    let id = registry.allocate(
        "db1",
        ServerConfig::new("10.0.0.1", "MySQLBackend", 3306).with_authenticator("auth", "opt"),
    )?;
    registry.set_status(id, StatusFlag::Slave)?;
    registry.add_parameter(id, "weight", "3")?;

    let json = serde_json::to_value(registry.snapshot()?)
        .map_err(|e| Error::Other(e.to_string()))?;
    let entry = &json[0];
    assert_eq!(entry["unique_name"], "db1");
    assert_eq!(entry["port"], 3306);
    assert_eq!(entry["status"], "Slave, Running");
    assert_eq!(entry["id"], id.to_string());

    Ok(())
}

#[test]
fn test_free_rejects_server_from_another_registry() -> Result<()> {
    let first = ServerRegistry::new();
    let second = ServerRegistry::new();
    let foreign = second.allocate("db1", ServerConfig::new("10.0.0.5", "MySQLBackend", 3306))?;
    let local = first.allocate("db1", ServerConfig::new("10.0.0.6", "MySQLBackend", 3306))?;

    assert!(matches!(first.free(foreign), Err(Error::ServerNotFound(_))));
    assert_eq!(first.len()?, 1);
    assert_eq!(first.find_by_unique_name("db1")?, Some(local));
    assert!(second.contains(foreign)?);

    Ok(())
}
