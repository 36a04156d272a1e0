use crate::error::{Error, Result};
use serde::Serialize;

/// Ordered list of string key/value pairs.
///
/// Keys are unique and insertion order is kept, so a list renders the same
/// way every time it is written out. Adding a key that is already present is
/// rejected rather than overwriting the earlier value.
///
/// # Examples
///
/// ```
/// use proxy_registry::config::ParameterList;
///
/// let mut params = ParameterList::new();
/// params.add("weight", "10").unwrap();
/// assert_eq!(params.get("weight"), Some("10"));
/// assert!(params.add("weight", "20").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterList {
    entries: Vec<(String, String)>,
}

impl ParameterList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new pair, failing if `key` is already present.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if self.contains(&key) {
            return Err(Error::Validation(format!("Duplicate parameter '{}'", key)));
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Replace the value of an existing key, keeping its position.
    ///
    /// Returns `false` when the key is not present.
    pub fn update(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => {
                entry.1 = value.into();
                true
            }
            None => false,
        }
    }

    /// Look up the value stored for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Check whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate over the pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy the pairs out in insertion order
    pub fn to_ordered_pairs(&self) -> Vec<(String, String)> {
        self.entries.clone()
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no pairs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
