//! Admission settings files.

use super::ConfigSource;
use crate::error::{AdmissionError, Result};
use crate::settings::AdmissionSettings;
use config::FileFormat;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Format of a settings file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// `.yaml` or `.yml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl SettingsFormat {
    /// Detect the format of `path`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` naming the file when the extension is missing or unsupported.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            other => Err(AdmissionError::LoadError(format!(
                "settings file {} has {}, expected .yaml, .yml, .toml or .json",
                path.display(),
                other.map_or_else(|| "no extension".to_string(), |ext| format!("extension '.{ext}'")),
            ))),
        }
    }

    fn file_format(self) -> FileFormat {
        match self {
            Self::Yaml => FileFormat::Yaml,
            Self::Toml => FileFormat::Toml,
            Self::Json => FileFormat::Json,
        }
    }
}

impl fmt::Display for SettingsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}

/// One admission settings file.
///
/// Loading rejects keys [`AdmissionSettings`] does not declare and values
/// that do not deserialize, naming the file, so a typo in one layer is not
/// silently ignored by the merge.
///
/// # Examples
///
/// ```rust,no_run
/// use machineset_admission::sources::FileSource;
///
/// let source = FileSource::new("/etc/machineset-admission/settings.yaml");
/// ```
pub struct FileSource {
    path: PathBuf,
    priority: i32,
}

impl FileSource {
    /// Settings file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            priority: 100,
        }
    }

    /// Set the merge priority. Higher wins.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn parse(&self, format: SettingsFormat) -> Result<config::Config> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            AdmissionError::LoadError(format!(
                "cannot read settings file {}: {e}",
                self.path.display()
            ))
        })?;

        config::Config::builder()
            .add_source(config::File::from_str(&contents, format.file_format()))
            .build()
            .map_err(|e| {
                AdmissionError::LoadError(format!(
                    "settings file {} is not valid {format}: {e}",
                    self.path.display()
                ))
            })
    }

    fn check_keys(&self, values: &HashMap<String, config::Value>) -> Result<()> {
        let mut unknown: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|key| !AdmissionSettings::KEYS.contains(key))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }

        unknown.sort_unstable();
        Err(AdmissionError::LoadError(format!(
            "settings file {} has unknown key(s) {}; known keys are {}",
            self.path.display(),
            unknown.join(", "),
            AdmissionSettings::KEYS.join(", ")
        )))
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        let format = SettingsFormat::from_path(&self.path)?;
        let parsed = self.parse(format)?;

        let values = parsed
            .clone()
            .try_deserialize::<HashMap<String, config::Value>>()
            .map_err(|e| {
                AdmissionError::LoadError(format!(
                    "settings file {} must be a mapping at the top level: {e}",
                    self.path.display()
                ))
            })?;
        self.check_keys(&values)?;

        parsed.try_deserialize::<AdmissionSettings>().map_err(|e| {
            AdmissionError::DeserializationError(format!(
                "settings file {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(values)
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
