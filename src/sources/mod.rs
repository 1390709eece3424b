//! Sources the admission settings are merged from.

mod config_source;
mod env;
mod file;

pub use config_source::ConfigSource;
pub use env::EnvSource;
pub use file::{FileSource, SettingsFormat};
