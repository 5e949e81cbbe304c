//! The label table: class names indexed by model output position

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Ordered class names. Position `i` names the `i`-th model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Self {
        LabelTable { names }
    }

    /// Read the table stored under `key` in a JSON annotation file
    pub fn load(path: impl AsRef<Path>, key: &str) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read annotation file {}", path.display()))?;
        Self::from_json(&raw, key)
            .with_context(|| format!("malformed annotation file {}", path.display()))
    }

    /// Parse an annotation document. Entries are either bare strings or a
    /// singleton array wrapping the name
    pub fn from_json(raw: &str, key: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(raw)?;
        let entries = doc
            .get(key)
            .ok_or_else(|| anyhow!("missing key {key:?}"))?
            .as_array()
            .ok_or_else(|| anyhow!("{key:?} is not an array"))?;

        let names = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| unwrap_name(entry).with_context(|| format!("bad entry {i}")))
            .collect::<Result<Vec<String>>>()?;

        Ok(LabelTable { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

fn unwrap_name(entry: &Value) -> Result<String> {
    match entry {
        Value::String(name) => Ok(name.clone()),
        Value::Array(wrapped) => match wrapped.first() {
            Some(Value::String(name)) => Ok(name.clone()),
            Some(other) => bail!("expected a class name, got {other}"),
            None => bail!("empty class name wrapper"),
        },
        other => bail!("expected a class name, got {other}"),
    }
}
