use crate::config::{
    KEY_ADDRESS, KEY_AUTHENTICATOR, KEY_AUTHENTICATOR_OPTIONS, KEY_PORT, KEY_PROTOCOL,
};
use crate::error::{Error, Result};
use crate::server::Server;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Render a server as a single configuration section.
///
/// Fixed keys come first in the order address, protocol, port, authenticator,
/// authenticator options; extra parameters follow in insertion order. Every
/// line, the last included, ends with `\n`.
pub fn render_server(server: &Server) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "[{}]", server.unique_name());
    let _ = writeln!(out, "{}={}", KEY_ADDRESS, server.address());
    let _ = writeln!(out, "{}={}", KEY_PROTOCOL, server.protocol());
    let _ = writeln!(out, "{}={}", KEY_PORT, server.port());
    let _ = writeln!(out, "{}={}", KEY_AUTHENTICATOR, server.authenticator());
    let _ = writeln!(
        out,
        "{}={}",
        KEY_AUTHENTICATOR_OPTIONS,
        server.authenticator_options()
    );
    for (key, value) in server.parameters().iter() {
        let _ = writeln!(out, "{}={}", key, value);
    }
    out
}

/// Write a server's definition to `path`.
///
/// The text goes to a temporary file in the same directory which is then
/// renamed over `path`, so readers see either the old file or the new one.
///
/// # Errors
///
/// Returns [`Error::Io`] if the temporary file cannot be created, written or
/// moved into place. Any existing file at `path` is left as it was.
pub fn serialize_server(server: &Server, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = render_server(server);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let io_err = |what: &str, e: std::io::Error| {
        tracing::error!(path = ?path, error = %e, "Failed to {}", what);
        Error::Io(format!("Failed to {} for '{}': {}", what, path.display(), e))
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_err("create temporary file", e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| io_err("write server definition", e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| io_err("sync server definition", e))?;
    tmp.persist(path)
        .map_err(|e| io_err("move server definition into place", e.error))?;

    tracing::debug!(server = %server.unique_name(), path = ?path, "Serialized server");
    Ok(())
}
