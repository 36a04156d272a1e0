use assert_fs::TempDir;
use assert_fs::prelude::*;
use proxy_registry::config::{PersistConfig, ServerConfig, render_server, serialize_server};
use proxy_registry::error::{Error, Result};
use proxy_registry::server::{ServerLifecycleEvent, ServerLifecycleManager, ServerRegistry};
use std::sync::Arc;

fn temp_dir() -> Result<TempDir> {
    TempDir::new().map_err(|e| Error::Io(e.to_string()))
}

fn read(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Io(e.to_string()))
}

fn manager_in(dir: &TempDir) -> ServerLifecycleManager {
    ServerLifecycleManager::new(
        Arc::new(ServerRegistry::new()),
        PersistConfig::new(dir.path().join("persisted")),
    )
}

#[test]
fn test_serialize_reload_reserialize_is_identical() -> Result<()> {
    let temp = temp_dir()?;
    let original_manager = manager_in(&temp);
    let registry = original_manager.registry();

    let config = ServerConfig::new("127.0.0.1", "HTTPD", 9876)
        .with_authenticator("NullAuthAllow", "fake=option");
    let server = registry.allocate("127.0.0.1", config)?;
    registry.set_unique_name(server, "serialized-server")?;
    registry.add_parameter(server, "weight", "5")?;
    registry.add_parameter(server, "zone", "eu-west")?;

    let first = temp.path().join("server.cnf");
    original_manager.serialize(server, &first)?;

    // Reload as a restarted process would, into an empty registry
    let reloaded_manager = manager_in(&temp);
    let created = reloaded_manager.reload(&first)?;

    let original = registry.get(server)?;
    let copy = reloaded_manager.registry().get(created)?;
    assert!(copy.same_definition(&original));
    assert_eq!(copy.address(), "127.0.0.1");
    assert_eq!(copy.protocol(), "HTTPD");
    assert_eq!(copy.port(), 9876);
    assert_eq!(copy.authenticator(), "NullAuthAllow");
    assert_eq!(copy.authenticator_options(), "fake=option");
    assert_eq!(copy.parameters(), original.parameters());

    let second = temp.path().join("server-created.cnf");
    reloaded_manager.serialize(created, &second)?;
    assert_eq!(read(&first)?, read(&second)?);

    Ok(())
}

#[test]
fn test_serialized_layout() -> Result<()> {
    let registry = ServerRegistry::new();
    let id = registry.allocate(
        "db1",
        ServerConfig::new("10.0.0.5", "MySQLBackend", 3306).with_authenticator("MySQLBackendAuth", ""),
    )?;
    registry.add_parameter(id, "zeta", "1")?;
    registry.add_parameter(id, "alpha", "2")?;

    let server = registry.get(id)?;
    let text = render_server(&server);
    assert_eq!(
        text,
        "[db1]\n\
         address=10.0.0.5\n\
         protocol=MySQLBackend\n\
         port=3306\n\
         authenticator=MySQLBackendAuth\n\
         authenticator_options=\n\
         zeta=1\n\
         alpha=2\n"
    );
    assert_eq!(render_server(&server), text);

    Ok(())
}

#[test]
fn test_reload_into_same_registry_collides() -> Result<()> {
    let temp = temp_dir()?;
    let manager = manager_in(&temp);
    let id = manager
        .registry()
        .allocate("db1", ServerConfig::new("10.0.0.5", "MySQLBackend", 3306))?;

    let path = manager.persist(id)?;
    assert_eq!(path, temp.path().join("persisted").join("db1.cnf"));

    assert!(matches!(manager.reload(&path), Err(Error::Collision(_))));
    assert_eq!(manager.registry().len()?, 1);

    // After freeing the original the same file reloads cleanly
    manager.destroy(id)?;
    let again = manager.reload(&path)?;
    assert_eq!(manager.registry().find_by_unique_name("db1")?, Some(again));

    let events: Vec<ServerLifecycleEvent> = manager
        .get_all_events(None)?
        .into_iter()
        .map(|e| e.event)
        .collect();
    assert_eq!(
        events,
        vec![
            ServerLifecycleEvent::Reloaded,
            ServerLifecycleEvent::Created,
            ServerLifecycleEvent::Freed,
            ServerLifecycleEvent::Persisted,
        ]
    );

    Ok(())
}

#[test]
fn test_reload_requires_a_single_section() -> Result<()> {
    let temp = temp_dir()?;
    let manager = manager_in(&temp);

    let empty = temp.child("empty.cnf");
    empty.write_str("# nothing here\n").map_err(|e| Error::Io(e.to_string()))?;
    assert!(matches!(manager.reload(empty.path()), Err(Error::Parse(_))));

    let two = temp.child("two.cnf");
    two.write_str(
        "[a]\naddress=a\nprotocol=p\nport=1\nauthenticator=\nauthenticator_options=\n\
         [b]\naddress=b\nprotocol=p\nport=2\nauthenticator=\nauthenticator_options=\n",
    )
    .map_err(|e| Error::Io(e.to_string()))?;
    assert!(matches!(manager.reload(two.path()), Err(Error::Parse(_))));
    assert!(manager.registry().is_empty()?);

    Ok(())
}

#[test]
fn test_load_rolls_back_on_failure() -> Result<()> {
    let temp = temp_dir()?;
    let manager = manager_in(&temp);

    let good = temp.child("good.cnf");
    good.write_str(
        "[a]\naddress=a\nprotocol=p\nport=1\nauthenticator=\nauthenticator_options=\n\
         [b]\naddress=b\nprotocol=p\nport=2\nauthenticator=\nauthenticator_options=\n",
    )
    .map_err(|e| Error::Io(e.to_string()))?;
    let bad = temp.child("bad.cnf");
    bad.write_str("[c]\naddress=c\nprotocol=p\nport=http\nauthenticator=\nauthenticator_options=\n")
        .map_err(|e| Error::Io(e.to_string()))?;

    let result = manager.load(&[good.path(), bad.path()]);
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(manager.registry().is_empty()?);

    // Every rolled back server gets a Freed event, newest first
    let events: Vec<(String, ServerLifecycleEvent)> = manager
        .get_all_events(None)?
        .into_iter()
        .map(|e| (e.name, e.event))
        .collect();
    assert_eq!(
        events,
        vec![
            ("b".to_string(), ServerLifecycleEvent::Freed),
            ("a".to_string(), ServerLifecycleEvent::Freed),
            ("b".to_string(), ServerLifecycleEvent::Created),
            ("a".to_string(), ServerLifecycleEvent::Created),
        ]
    );

    let ids = manager.load(&[good.path()])?;
    assert_eq!(ids.len(), 2);
    assert_eq!(manager.registry().find_by_unique_name("b")?, Some(ids[1]));

    Ok(())
}

#[test]
fn test_failed_write_leaves_no_file_and_success_replaces() -> Result<()> {
    let temp = temp_dir()?;
    let registry = ServerRegistry::new();
    let id = registry.allocate("db1", ServerConfig::new("10.0.0.5", "MySQLBackend", 3306))?;
    let server = registry.get(id)?;

    let target = temp.child("db1.cnf");
    target.write_str("[db1]\nprevious=contents\n").map_err(|e| Error::Io(e.to_string()))?;

    // The parent directory does not exist, so no temporary file can be created
    let missing = temp.path().join("no-such-dir").join("db1.cnf");
    assert!(matches!(serialize_server(&server, &missing), Err(Error::Io(_))));
    assert!(!missing.exists());

    serialize_server(&server, target.path())?;
    let text = String::from_utf8(read(target.path())?).map_err(|e| Error::Other(e.to_string()))?;
    assert!(text.starts_with("[db1]\naddress=10.0.0.5\n"));
    assert!(!text.contains("previous=contents"));

    Ok(())
}

#[test]
fn test_write_onto_directory_leaves_it_untouched() -> Result<()> {
    let temp = temp_dir()?;
    let registry = ServerRegistry::new();
    let id = registry.allocate("db1", ServerConfig::new("10.0.0.5", "MySQLBackend", 3306))?;
    let server = registry.get(id)?;

    // The target exists but is a non-empty directory, so the final rename fails
    let target = temp.child("db1.cnf");
    target.create_dir_all().map_err(|e| Error::Io(e.to_string()))?;
    let inner = target.child("keep");
    inner.write_str("[db1]\nprevious=contents\n").map_err(|e| Error::Io(e.to_string()))?;

    assert!(matches!(serialize_server(&server, target.path()), Err(Error::Io(_))));
    assert!(target.path().is_dir());
    assert_eq!(read(inner.path())?, b"[db1]\nprevious=contents\n".to_vec());

    // No temporary file is left next to the target
    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .map_err(|e| Error::Io(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path() != target.path())
        .collect();
    assert!(leftovers.is_empty());

    Ok(())
}

#[test]
fn test_persisted_files_stay_inside_the_directory() -> Result<()> {
    let temp = temp_dir()?;
    let manager = manager_in(&temp);
    let registry = manager.registry();

    for name in ["../escaped", "a/b", "..", "sub\\name"] {
        let config = ServerConfig::new("10.0.0.5", "MySQLBackend", 3306);
        assert!(matches!(registry.allocate(name, config), Err(Error::Validation(_))));
    }
    assert!(registry.is_empty()?);

    let id = registry.allocate("db1", ServerConfig::new("10.0.0.5", "MySQLBackend", 3306))?;
    assert!(matches!(
        registry.set_unique_name(id, "../outside"),
        Err(Error::Validation(_))
    ));
    assert_eq!(registry.get(id)?.unique_name(), "db1");

    let path = manager.persist(id)?;
    assert!(path.starts_with(temp.path().join("persisted")));
    assert!(!temp.path().join("escaped.cnf").exists());
    assert!(!temp.path().join("outside.cnf").exists());

    Ok(())
}
