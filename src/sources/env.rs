//! Environment variable settings source.

use super::ConfigSource;
use crate::error::{AdmissionError, Result};
use config::Environment;
use std::collections::HashMap;

/// Settings from environment variables sharing a prefix.
///
/// The prefix is joined to the key with a single `_`; `separator` splits
/// nested keys.
///
/// # Examples
///
/// ```rust
/// use machineset_admission::sources::EnvSource;
///
/// // MACHINESET_ADMISSION_DEFAULT_REPLICAS=5 -> default_replicas = 5
/// let source = EnvSource::new("MACHINESET_ADMISSION", "__");
/// ```
pub struct EnvSource {
    prefix: String,
    separator: String,
    priority: i32,
}

impl EnvSource {
    /// Create a new environment variable source.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "MACHINESET_ADMISSION")
    /// * `separator` - Separator for nested keys (e.g., "__")
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            priority: 300,
        }
    }

    /// Set the priority for this source.
    ///
    /// Higher priority sources override lower priority ones.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        let env_source = Environment::with_prefix(&self.prefix)
            .prefix_separator("_")
            .separator(&self.separator)
            .try_parsing(true);

        let config_builder = config::Config::builder()
            .add_source(env_source)
            .build()
            .map_err(|e| {
                AdmissionError::LoadError(format!(
                    "Failed to load environment variables: {}",
                    e
                ))
            })?;

        let map = config_builder
            .try_deserialize::<HashMap<String, config::Value>>()
            .map_err(|e| {
                AdmissionError::DeserializationError(format!(
                    "Failed to parse environment variables: {}",
                    e
                ))
            })?;

        Ok(map)
    }

    fn name(&self) -> String {
        format!("env:{}*", self.prefix)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_env_source_creation() {
        let source = EnvSource::new("MACHINESET_ADMISSION", "__");
        assert_eq!(source.prefix, "MACHINESET_ADMISSION");
        assert_eq!(source.separator, "__");
        assert_eq!(source.priority(), 300);
        assert_eq!(source.name(), "env:MACHINESET_ADMISSION*");
    }

    #[test]
    fn test_with_priority() {
        let source = EnvSource::new("MACHINESET_ADMISSION", "__").with_priority(400);
        assert_eq!(source.priority(), 400);
    }

    #[test]
    fn test_load_prefixed_variables() {
        // SAFETY: the prefix is unique to this test.
        unsafe {
            env::set_var("ENV_SOURCE_UNIT_DEFAULT_STATE", "Active");
        }

        let map = EnvSource::new("ENV_SOURCE_UNIT", "__").load().unwrap();
        assert_eq!(
            map.get("default_state").map(ToString::to_string),
            Some("Active".to_string())
        );

        unsafe {
            env::remove_var("ENV_SOURCE_UNIT_DEFAULT_STATE");
        }
    }

    #[test]
    fn test_load_without_matches_is_empty() {
        let map = EnvSource::new("ENV_SOURCE_UNIT_NONEXISTENT", "__").load().unwrap();
        assert!(map.is_empty());
    }
}
