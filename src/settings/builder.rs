//! Builder for loading [`AdmissionSettings`].

use crate::error::Result;
use crate::settings::{AdmissionSettings, SettingsLoader};
use crate::sources::{ConfigSource, EnvSource, FileSource};
use std::path::PathBuf;
use tracing::info;

/// Builder for loading admission settings.
///
/// # Examples
///
/// ```rust,no_run
/// use machineset_admission::settings::AdmissionSettings;
///
/// # fn example() -> machineset_admission::error::Result<()> {
/// let settings = AdmissionSettings::builder()
///     .with_file("/etc/machineset-admission/settings.yaml")
///     .with_env_overrides("MACHINESET_ADMISSION", "__")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct AdmissionSettingsBuilder {
    file_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
    custom_sources: Vec<Box<dyn ConfigSource>>,
}

impl AdmissionSettingsBuilder {
    /// Create a new builder with no sources.
    pub fn new() -> Self {
        Self {
            file_paths: Vec::new(),
            env_prefix: None,
            env_separator: None,
            custom_sources: Vec::new(),
        }
    }

    /// Add a settings file. YAML, TOML and JSON are detected by extension.
    ///
    /// Later files override earlier ones.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    /// Add environment variable overrides.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "MACHINESET_ADMISSION")
    /// * `separator` - Separator for nested keys (e.g., "__")
    ///
    /// Environment variables have the highest priority by default (300).
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Add a custom settings source.
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.custom_sources.push(Box::new(source));
        self
    }

    /// Load and merge every source.
    ///
    /// With no sources the defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A file is missing or has an unsupported extension
    /// - A source fails to parse
    /// - The merged settings do not deserialize
    pub fn build(self) -> Result<AdmissionSettings> {
        let mut loader = SettingsLoader::new();

        for (index, path) in self.file_paths.iter().enumerate() {
            let priority = 100 + (index as i32 * 10);
            loader.add_source(Box::new(FileSource::new(path).with_priority(priority)));
        }

        for source in self.custom_sources {
            loader.add_source(source);
        }

        if let (Some(prefix), Some(separator)) = (self.env_prefix, self.env_separator) {
            loader.add_source(Box::new(EnvSource::new(prefix, separator)));
        }

        let settings: AdmissionSettings = loader.load()?;
        info!(
            sources = ?loader.source_names(),
            policy = ?settings.discriminator_policy,
            platform_defaults = settings.platform_defaults.len(),
            "admission settings loaded"
        );
        Ok(settings)
    }
}

impl Default for AdmissionSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
