//! Settings source trait.

use crate::error::Result;
use std::collections::HashMap;

/// A place admission settings can be read from.
///
/// Sources return flat key-value maps that the settings loader merges by
/// priority. Implement this for sources other than files and environment,
/// for example a mounted ConfigMap rendered to a custom format.
pub trait ConfigSource: Send + Sync {
    /// Load settings as a key-value map.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed.
    fn load(&self) -> Result<HashMap<String, config::Value>>;

    /// Human-readable name, used in error messages and logs.
    fn name(&self) -> String;

    /// Merge priority, higher wins.
    ///
    /// Defaults used by [`AdmissionSettingsBuilder`](crate::settings::AdmissionSettingsBuilder):
    /// - Environment variables: 300
    /// - Files: 100, 110, 120... in the order added
    fn priority(&self) -> i32 {
        100
    }
}
