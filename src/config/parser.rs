use crate::config::ParameterList;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// One parsed `[section]` with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigContext {
    name: String,
    parameters: ParameterList,
}

impl ConfigContext {
    /// Create an empty section
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: ParameterList::new(),
        }
    }

    /// Section name, which becomes the server's unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in file order
    pub fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    /// Value of `key` within this section
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key)
    }
}

/// Section names seen during one load pass.
///
/// A fresh context is created per [`parse_file`] call. When several files
/// make up one configuration, share a single context through
/// [`parse_file_with`] or [`parse_files`] so that a name repeated across
/// files is rejected too.
#[derive(Debug, Default)]
pub struct DuplicateContext {
    seen: HashSet<String>,
}

impl DuplicateContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name`, returning `false` if it was already recorded
    pub fn register(&mut self, name: &str) -> bool {
        self.seen.insert(name.to_string())
    }

    /// Whether `name` has been recorded
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }
}

/// Parses a configuration file into its sections, in file order.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Parse`] if
/// its contents are malformed or a section name repeats.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<ConfigContext>> {
    let mut duplicates = DuplicateContext::new();
    parse_file_with(path, &mut duplicates)
}

/// Parses a configuration file, recording section names in `duplicates`.
///
/// # Errors
///
/// Same as [`parse_file`]; a name already present in `duplicates` is a
/// parse error.
pub fn parse_file_with(
    path: impl AsRef<Path>,
    duplicates: &mut DuplicateContext,
) -> Result<Vec<ConfigContext>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!(path = ?path, error = %e, "Failed to read config file");
        Error::Io(format!("Failed to read config file '{}': {}", path.display(), e))
    })?;

    parse_str(&content, &path.display().to_string(), duplicates).map_err(|e| {
        tracing::error!(path = ?path, error = %e, "Failed to parse config file");
        e
    })
}

/// Parses several files as one configuration with a shared duplicate check.
///
/// # Errors
///
/// Fails on the first file that cannot be read or parsed; nothing from the
/// earlier files is returned in that case.
pub fn parse_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ConfigContext>> {
    let mut duplicates = DuplicateContext::new();
    let mut contexts = Vec::new();
    for path in paths {
        contexts.extend(parse_file_with(path, &mut duplicates)?);
    }
    Ok(contexts)
}

/// Parses configuration text.
///
/// `source` only appears in error messages.
///
/// # Errors
///
/// Returns [`Error::Parse`] when:
/// * a line is neither blank, a comment, a section header nor `key=value`
/// * a `key=value` line appears before the first section header
/// * a section header is empty or its name is already in `duplicates`
/// * a key repeats within one section
pub fn parse_str(
    content: &str,
    source: &str,
    duplicates: &mut DuplicateContext,
) -> Result<Vec<ConfigContext>> {
    let mut contexts: Vec<ConfigContext> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    Error::Parse(format!(
                        "{}:{}: malformed section header '{}'",
                        source, line_no, line
                    ))
                })?;

            if !duplicates.register(name) {
                return Err(Error::Parse(format!(
                    "{}:{}: duplicate section '{}'",
                    source, line_no, name
                )));
            }
            contexts.push(ConfigContext::new(name));
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            Error::Parse(format!(
                "{}:{}: expected 'key=value', found '{}'",
                source, line_no, line
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::Parse(format!("{}:{}: empty key", source, line_no)));
        }

        let context = contexts.last_mut().ok_or_else(|| {
            Error::Parse(format!(
                "{}:{}: parameter '{}' outside of any section",
                source, line_no, key
            ))
        })?;
        context.parameters.add(key, value.trim()).map_err(|_| {
            Error::Parse(format!(
                "{}:{}: duplicate parameter '{}' in section '{}'",
                source, line_no, key, context.name
            ))
        })?;
    }

    Ok(contexts)
}
