use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::properties::error::PropertyError;

/// Flat string key/value store backing the resolver. Built once at
/// startup from the process environment, explicit pairs, or a file;
/// immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct PropertySource {
    values: HashMap<String, String>,
}

impl PropertySource {
    /// Snapshot of the process environment. Entries that are not valid
    /// UTF-8 are skipped.
    pub fn from_env() -> Self {
        let values = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { values }
    }

    /// Only the given pairs, no environment fallback.
    pub fn of<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values }
    }

    /// Environment snapshot overlaid with the given pairs; explicit
    /// pairs win over environment entries of the same key.
    pub fn with_properties<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::from_env();
        for (k, v) in pairs {
            source.values.insert(k.into(), v.into());
        }
        source
    }

    /// Only the entries of the given file, dispatched on its extension
    /// (`.properties`, `.json`, `.yaml`/`.yml`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PropertyError> {
        let path = path.as_ref();
        let parsed = Self::parse_file(path)?;
        debug!(path = %path.display(), entries = parsed.len(), "loaded property file");
        Ok(Self { values: parsed })
    }

    /// Environment snapshot overlaid with the entries of the given file.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self, PropertyError> {
        let path = path.as_ref();
        let parsed = Self::parse_file(path)?;
        debug!(path = %path.display(), entries = parsed.len(), "loaded property file over environment");
        let mut source = Self::from_env();
        source.values.extend(parsed);
        Ok(source)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn parse_file(path: &Path) -> Result<HashMap<String, String>, PropertyError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let text = std::fs::read_to_string(path)?;
        match extension.as_deref() {
            Some("properties") => Self::parse_properties(&text),
            Some("json") => Self::parse_json(&text),
            Some("yaml") | Some("yml") => Self::parse_yaml(&text),
            _ => Err(PropertyError::UnknownFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Parse `key=value` lines. Blank lines and lines starting with `#`
    /// or `!` are skipped; the first `=` or `:` separates key from value.
    pub fn parse_properties(text: &str) -> Result<HashMap<String, String>, PropertyError> {
        let mut values = HashMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let sep = line.find(['=', ':']).ok_or_else(|| {
                PropertyError::parse(idx + 1, "expected 'key=value' or 'key: value'")
            })?;
            let key = line[..sep].trim_end();
            if key.is_empty() {
                return Err(PropertyError::parse(idx + 1, "empty property key"));
            }
            let value = line[sep + 1..].trim_start();
            values.insert(key.to_string(), value.to_string());
        }
        Ok(values)
    }

    /// Parse a JSON object into dotted keys. Nested objects extend the
    /// key with `.`, array elements with their index; nulls are skipped.
    pub fn parse_json(text: &str) -> Result<HashMap<String, String>, PropertyError> {
        let root: serde_json::Value = serde_json::from_str(text)?;
        let mut values = HashMap::new();
        flatten_json("", &root, &mut values);
        Ok(values)
    }

    /// Parse a YAML mapping into dotted keys, same flattening as JSON.
    /// Mapping entries with non-string keys are skipped.
    pub fn parse_yaml(text: &str) -> Result<HashMap<String, String>, PropertyError> {
        let root: serde_yaml::Value = serde_yaml::from_str(text)?;
        let mut values = HashMap::new();
        flatten_yaml("", &root, &mut values);
        Ok(values)
    }
}

fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn flatten_json(prefix: &str, value: &serde_json::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                flatten_json(&join_key(prefix, key), child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten_json(&join_key(prefix, &idx.to_string()), child, out);
            }
        }
        serde_json::Value::Null => {}
        serde_json::Value::String(s) => {
            insert_scalar(prefix, s.clone(), out);
        }
        serde_json::Value::Bool(b) => {
            insert_scalar(prefix, b.to_string(), out);
        }
        serde_json::Value::Number(n) => {
            insert_scalar(prefix, n.to_string(), out);
        }
    }
}

fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, child) in map {
                match key.as_str() {
                    Some(key) => flatten_yaml(&join_key(prefix, key), child, out),
                    None => warn!(prefix, "skipping mapping entry with non-string key"),
                }
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten_yaml(&join_key(prefix, &idx.to_string()), child, out);
            }
        }
        serde_yaml::Value::Null => {}
        serde_yaml::Value::String(s) => {
            insert_scalar(prefix, s.clone(), out);
        }
        serde_yaml::Value::Bool(b) => {
            insert_scalar(prefix, b.to_string(), out);
        }
        serde_yaml::Value::Number(n) => {
            insert_scalar(prefix, n.to_string(), out);
        }
        serde_yaml::Value::Tagged(tagged) => {
            flatten_yaml(prefix, &tagged.value, out);
        }
    }
}

fn insert_scalar(key: &str, value: String, out: &mut HashMap<String, String>) {
    if key.is_empty() {
        warn!("skipping scalar document root; property files must be maps");
        return;
    }
    out.insert(key.to_string(), value);
}
