use crate::config::{RESERVED_KEYS, ServerConfig};
use crate::error::{Error, Result};

/// Validates a server definition before it is registered
pub fn validate_server_config(name: &str, config: &ServerConfig) -> Result<()> {
    validate_unique_name(name)?;

    if config.address.trim().is_empty() {
        return Err(Error::Validation(format!("Server '{}' has empty address", name)));
    }

    // Module identifiers are resolved elsewhere; only emptiness is checked here
    if config.protocol.trim().is_empty() {
        return Err(Error::Validation(format!("Server '{}' has empty protocol", name)));
    }

    if config.port > u32::from(u16::MAX) {
        return Err(Error::Validation(format!(
            "Server '{}' has port {} outside 0-65535",
            name, config.port
        )));
    }

    for field in [
        &config.address,
        &config.protocol,
        &config.authenticator,
        &config.authenticator_options,
    ] {
        validate_value(name, field)?;
    }

    for (key, value) in config.parameters.iter() {
        validate_parameter(key, value)?;
    }

    Ok(())
}

/// Validates a unique name.
///
/// The name must be writable as a section header and usable as a single
/// file name component inside the persistence directory.
pub fn validate_unique_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("Unique name is empty".to_string()));
    }
    if name != name.trim() || name.contains(['[', ']', '\n', '\r']) {
        return Err(Error::Validation(format!(
            "Unique name '{}' cannot be written as a section header",
            name.escape_debug()
        )));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(Error::Validation(format!(
            "Unique name '{}' cannot be used as a file name",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Validates an extra parameter.
///
/// The key may not be one of the fixed server keys and both key and value
/// must survive being written as a `key=value` line and read back.
pub fn validate_parameter(key: &str, value: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::Validation("Parameter key is empty".to_string()));
    }
    if RESERVED_KEYS.contains(&key) {
        return Err(Error::Validation(format!(
            "Parameter '{}' is a reserved server key",
            key
        )));
    }
    if key != key.trim() || key.contains(['=', '[', '#', ';', '\n', '\r']) {
        return Err(Error::Validation(format!(
            "Parameter key '{}' cannot be written to a configuration file",
            key.escape_debug()
        )));
    }
    validate_value(key, value)
}

pub(crate) fn validate_value(owner: &str, value: &str) -> Result<()> {
    if value != value.trim() || value.contains(['\n', '\r']) {
        return Err(Error::Validation(format!(
            "Value '{}' of '{}' has surrounding whitespace or a line break",
            value.escape_debug(),
            owner
        )));
    }
    Ok(())
}
