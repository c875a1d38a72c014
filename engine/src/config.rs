//! String-keyed configuration store backed by a TOML file
//!
//! Nested TOML tables are flattened into dotted keys
//! (`[ranking.weights] temperature = 0.2` becomes
//! `ranking.weights.temperature`), so components read configuration the
//! same way regardless of how the file nests it. Registered defaults
//! answer for any key the file does not set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Well-known configuration keys
pub mod keys {
    pub const WEIGHT_TEMPERATURE: &str = "ranking.weights.temperature";
    pub const WEIGHT_TOKEN: &str = "ranking.weights.token";
    pub const WEIGHT_SEMANTIC: &str = "ranking.weights.semantic";
    pub const WEIGHT_LENGTH: &str = "ranking.weights.length";
    pub const EMBEDDING_PROVIDER: &str = "ranking.embedding_provider";
    pub const EMBEDDING_MODEL: &str = "ranking.embedding_model";
}

/// A single configuration value
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Float(f64),
    Text(String),
    Flag(bool),
}

/// Thread-safe configuration store with defaults and file reload
pub struct ConfigStore {
    path: Option<PathBuf>,
    defaults: HashMap<String, ConfigValue>,
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl ConfigStore {
    /// Create a store with built-in defaults and no backing file
    pub fn new() -> Self {
        Self {
            path: None,
            defaults: built_in_defaults(),
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store backed by a TOML file, reading it immediately
    pub fn from_file(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let store = Self {
            path: Some(path.into()),
            defaults: built_in_defaults(),
            values: RwLock::new(HashMap::new()),
        };
        store.reload()?;
        Ok(store)
    }

    /// Path of the config file currently in use, if any
    pub fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-read the backing file, replacing all file-sourced values.
    ///
    /// Runtime `set` overrides are discarded by a reload; defaults are
    /// untouched. A store without a backing file reloads to empty.
    pub fn reload(&self) -> EngineResult<()> {
        let Some(path) = &self.path else {
            self.values
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .clear();
            return Ok(());
        };

        let raw = std::fs::read_to_string(path)?;
        let parsed: toml::Value = toml::from_str(&raw).map_err(|e| EngineError::Config {
            message: format!("{}: {e}", path.display()),
        })?;

        let mut flat = HashMap::new();
        flatten("", &parsed, &mut flat);
        debug!(config_file = %path.display(), keys = flat.len(), "loaded configuration");

        *self.values.write().unwrap_or_else(|e| e.into_inner()) = flat;
        Ok(())
    }

    /// Set a value at runtime, shadowing the file and defaults
    pub fn set(&self, key: &str, value: ConfigValue) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    /// Get a float value, falling back to the registered default, then 0.0
    pub fn get_f64(&self, key: &str) -> f64 {
        match self.lookup(key) {
            Some(ConfigValue::Float(v)) => v,
            Some(ConfigValue::Text(s)) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Get a string value, falling back to the registered default, then ""
    pub fn get_str(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(ConfigValue::Text(s)) => s,
            Some(ConfigValue::Float(v)) => v.to_string(),
            Some(ConfigValue::Flag(b)) => b.to_string(),
            None => String::new(),
        }
    }

    fn lookup(&self, key: &str) -> Option<ConfigValue> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values
            .get(key)
            .or_else(|| self.defaults.get(key))
            .cloned()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn built_in_defaults() -> HashMap<String, ConfigValue> {
    HashMap::from([
        (keys::WEIGHT_TEMPERATURE.to_string(), ConfigValue::Float(0.25)),
        (keys::WEIGHT_TOKEN.to_string(), ConfigValue::Float(0.25)),
        (keys::WEIGHT_SEMANTIC.to_string(), ConfigValue::Float(0.35)),
        (keys::WEIGHT_LENGTH.to_string(), ConfigValue::Float(0.15)),
        (keys::EMBEDDING_PROVIDER.to_string(), ConfigValue::Text("openai".to_string())),
        (keys::EMBEDDING_MODEL.to_string(), ConfigValue::Text("text-embedding-3-small".to_string())),
    ])
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut HashMap<String, ConfigValue>) {
    match value {
        toml::Value::Table(table) => {
            for (key, nested) in table {
                let full = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&full, nested, out);
            }
        }
        toml::Value::Float(v) => {
            out.insert(prefix.to_string(), ConfigValue::Float(*v));
        }
        toml::Value::Integer(v) => {
            out.insert(prefix.to_string(), ConfigValue::Float(*v as f64));
        }
        toml::Value::String(s) => {
            out.insert(prefix.to_string(), ConfigValue::Text(s.clone()));
        }
        toml::Value::Boolean(b) => {
            out.insert(prefix.to_string(), ConfigValue::Flag(*b));
        }
        // Arrays and datetimes have no dotted-key representation here
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_answer_for_unset_keys() {
        let store = ConfigStore::new();
        assert_eq!(store.get_f64(keys::WEIGHT_SEMANTIC), 0.35);
        assert_eq!(store.get_str(keys::EMBEDDING_PROVIDER), "openai");
        assert_eq!(store.get_f64("ranking.weights.missing"), 0.0);
    }

    #[test]
    fn test_file_values_shadow_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[ranking.weights]\ntemperature = 0.5\ntoken = 0.5\n\n[ranking]\nembedding_provider = \"ollama\"\n"
        )
        .unwrap();

        let store = ConfigStore::from_file(file.path()).unwrap();
        assert_eq!(store.get_f64(keys::WEIGHT_TEMPERATURE), 0.5);
        assert_eq!(store.get_str(keys::EMBEDDING_PROVIDER), "ollama");
        // Unset key still answered by the default
        assert_eq!(store.get_f64(keys::WEIGHT_SEMANTIC), 0.35);
    }

    #[test]
    fn test_reload_picks_up_rewritten_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[ranking.weights]\ntemperature = 0.1\n").unwrap();
        let store = ConfigStore::from_file(file.path()).unwrap();
        assert_eq!(store.get_f64(keys::WEIGHT_TEMPERATURE), 0.1);

        std::fs::write(file.path(), "[ranking.weights]\ntemperature = 0.9\n").unwrap();
        store.reload().unwrap();
        assert_eq!(store.get_f64(keys::WEIGHT_TEMPERATURE), 0.9);
    }

    #[test]
    fn test_reload_fails_on_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[ranking.weights]\ntemperature = 0.1\n").unwrap();
        let store = ConfigStore::from_file(file.path()).unwrap();

        std::fs::write(file.path(), "not [ valid toml").unwrap();
        assert!(store.reload().is_err());
    }

    #[test]
    fn test_integer_values_read_as_floats() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[ranking.weights]\ntemperature = 1\n").unwrap();
        let store = ConfigStore::from_file(file.path()).unwrap();
        assert_eq!(store.get_f64(keys::WEIGHT_TEMPERATURE), 1.0);
    }
}
