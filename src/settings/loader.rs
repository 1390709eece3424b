//! Merges settings sources by priority.

use crate::error::{AdmissionError, Result};
use crate::sources::ConfigSource;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Loads and merges settings from multiple sources.
///
/// Sources are sorted by priority and merged lowest first, so higher priority
/// sources override.
pub(crate) struct SettingsLoader {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsLoader {
    pub(crate) fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub(crate) fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
    }

    /// Source names in merge order.
    pub(crate) fn source_names(&self) -> Vec<String> {
        self.sorted().iter().map(|s| s.name()).collect()
    }

    /// Load and merge every source into `T`.
    ///
    /// With no sources the result is deserialized from an empty map, so `T`
    /// must default its fields.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any source fails to load
    /// - Deserialization fails
    pub(crate) fn load<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut builder = config::Config::builder();

        for source in self.sorted() {
            let values = source.load().map_err(|e| {
                AdmissionError::LoadError(format!("Failed to load source '{}': {}", source.name(), e))
            })?;
            debug!(source = %source.name(), keys = values.len(), "merging settings source");

            for (key, value) in values {
                builder = builder.set_override(&key, value).map_err(|e| {
                    AdmissionError::LoadError(format!(
                        "Failed to merge source '{}': {}",
                        source.name(),
                        e
                    ))
                })?;
            }
        }

        let config = builder
            .build()
            .map_err(|e| AdmissionError::LoadError(format!("Failed to build settings: {}", e)))?;

        config.try_deserialize::<T>().map_err(|e| {
            AdmissionError::DeserializationError(format!("Failed to deserialize settings: {}", e))
        })
    }

    fn sorted(&self) -> Vec<&dyn ConfigSource> {
        let mut sorted: Vec<&dyn ConfigSource> = self.sources.iter().map(AsRef::as_ref).collect();
        sorted.sort_by_key(|s| s.priority());
        sorted
    }
}
