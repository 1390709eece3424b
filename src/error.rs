//! Error types for machineset-admission.
//!
//! Two families live here. [`AdmissionError`] covers configuration-time
//! failures: bad schema tables, bad settings, unparseable input. [`Violation`]
//! is the request-time rejection of a candidate object. The validator never
//! turns a violation into an `AdmissionError`.

use crate::core::PathSegment;
use std::fmt;

/// Result type alias for machineset-admission operations.
pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Errors raised while building a validator, loading settings or parsing input.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// A string pattern in a schema table failed to compile.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// A default points at a path the schema does not declare.
    #[error("Default for '{path}' does not resolve against schema '{schema}': {reason}")]
    InvalidDefault {
        /// Dotted path of the default
        path: String,
        /// Schema node the path was resolved from
        schema: String,
        /// Why resolution failed
        reason: String,
    },

    /// Two branches of one union claim the same discriminator value or payload field.
    #[error("Duplicate branch '{branch}' with payload field '{field}'")]
    DuplicateBranch {
        /// Discriminator value of the rejected branch
        branch: String,
        /// Payload field of the rejected branch
        field: String,
    },

    /// A union names a discriminator field its node does not declare.
    #[error("Union discriminator '{discriminator}' is not a field of schema '{schema}'")]
    UnknownDiscriminatorField {
        /// Schema node name
        schema: String,
        /// Missing discriminator field
        discriminator: String,
    },

    /// Failed to load settings from a source.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// Failed to deserialize settings.
    #[error("Failed to deserialize settings: {0}")]
    DeserializationError(String),

    /// Candidate input could not be parsed into an object tree.
    #[error("Failed to parse input: {0}")]
    Parse(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for AdmissionError {
    fn from(err: serde_json::Error) -> Self {
        AdmissionError::Parse(err.to_string())
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Error> for AdmissionError {
    fn from(err: serde_yaml::Error) -> Self {
        AdmissionError::Parse(err.to_string())
    }
}

/// Category of a rejected rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Presence, absence or exclusivity failure at an object or union node.
    Structural,
    /// Type, enum, length or pattern failure on a single value.
    Format,
    /// A discriminator value with no registered branch under a fail-closed policy.
    UnknownDiscriminator,
}

/// A single rule failure attributed to a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    path: Vec<PathSegment>,
    kind: ViolationKind,
    message: String,
}

impl Violation {
    pub(crate) fn new(path: Vec<PathSegment>, kind: ViolationKind, message: String) -> Self {
        Self {
            path,
            kind,
            message,
        }
    }

    /// Path segments from the root to the offending node.
    pub fn segments(&self) -> &[PathSegment] {
        &self.path
    }

    /// Rendered path, e.g. `spec.template.failureDomains.openstack[0]`.
    pub fn path(&self) -> String {
        PathSegment::render(&self.path)
    }

    /// Violation category.
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Message without the path prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path(), self.message)
    }
}

impl std::error::Error for Violation {}

/// Ordered, non-empty list of violations from one validation run.
///
/// Order is evaluation order: depth-first, declaration order within a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Wrap a list of violations. Returns `None` for an empty list.
    pub(crate) fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterate violations in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Rendered `path: message` lines, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}
