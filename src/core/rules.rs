//! Declarative constraints evaluated against a single schema node.
//!
//! Node-level constraints are built from a small [`Condition`] algebra over
//! sibling fields and are reported at the node's own path. Value-level rules
//! ([`StringRules`], [`IntegerRules`]) are reported at the field's path.

use crate::core::PathTracker;
use crate::error::{AdmissionError, Result, ViolationKind};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::fmt;

/// Path to a field relative to the node a condition is evaluated on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef(Vec<String>);

impl FieldRef {
    /// A single key, taken verbatim. Use this for map keys containing dots.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![key.into()])
    }

    /// Resolve against an object. Null counts as absent.
    pub fn lookup<'v>(&self, object: &'v Map<String, Value>) -> Option<&'v Value> {
        let (first, rest) = self.0.split_first()?;
        let mut current = object.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }
}

impl From<&str> for FieldRef {
    fn from(dotted: &str) -> Self {
        Self(dotted.split('.').map(str::to_string).collect())
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Predicate over the fields of one object node.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field exists and is not null.
    Present(FieldRef),
    /// Field is a string equal to the value.
    Equals(FieldRef, String),
    /// Negation.
    Not(Box<Condition>),
    /// Every condition holds. Empty is true.
    All(Vec<Condition>),
    /// At least one condition holds. Empty is false.
    Any(Vec<Condition>),
}

impl Condition {
    /// `has(field)`.
    pub fn present(field: impl Into<FieldRef>) -> Self {
        Self::Present(field.into())
    }

    /// `field == value`.
    pub fn equals(field: impl Into<FieldRef>, value: impl Into<String>) -> Self {
        Self::Equals(field.into(), value.into())
    }

    /// `!self`.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate against an object node.
    pub fn holds(&self, object: &Map<String, Value>) -> bool {
        match self {
            Self::Present(field) => field.lookup(object).is_some(),
            Self::Equals(field, expected) => {
                field.lookup(object).and_then(Value::as_str) == Some(expected.as_str())
            }
            Self::Not(inner) => !inner.holds(object),
            Self::All(conditions) => conditions.iter().all(|c| c.holds(object)),
            Self::Any(conditions) => conditions.iter().any(|c| c.holds(object)),
        }
    }
}

/// A rule that must hold on an object node, with the message reported when it does not.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    condition: Condition,
    message: String,
    kind: ViolationKind,
}

impl Constraint {
    /// General rule: `condition` must hold.
    pub fn rule(condition: Condition, message: impl Into<String>) -> Self {
        Self {
            condition,
            message: message.into(),
            kind: ViolationKind::Structural,
        }
    }

    /// `field` must be present whenever `when` holds.
    pub fn required_when(
        field: impl Into<FieldRef>,
        when: Condition,
        message: impl Into<String>,
    ) -> Self {
        Self::rule(
            Condition::Any(vec![when.negate(), Condition::Present(field.into())]),
            message,
        )
    }

    /// `field` must be absent unless `when` holds.
    pub fn forbidden_unless(
        field: impl Into<FieldRef>,
        when: Condition,
        message: impl Into<String>,
    ) -> Self {
        Self::rule(
            Condition::Any(vec![when, Condition::Present(field.into()).negate()]),
            message,
        )
    }

    /// `field` is present exactly when `when` holds.
    ///
    /// Failing either direction reports the same message.
    pub fn required_iff(
        field: impl Into<FieldRef>,
        when: Condition,
        message: impl Into<String>,
    ) -> Self {
        let present = Condition::Present(field.into());
        Self::rule(
            Condition::Any(vec![
                Condition::All(vec![when.clone(), present.clone()]),
                Condition::All(vec![when.negate(), present.negate()]),
            ]),
            message,
        )
    }

    /// Override the violation category.
    pub fn with_kind(mut self, kind: ViolationKind) -> Self {
        self.kind = kind;
        self
    }

    /// The underlying predicate.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Message reported on failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Ordered constraints attached to one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    constraints: Vec<Constraint>,
}

impl RuleSet {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constraint.
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Append a constraint in place.
    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// True when no constraints are declared.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Constraints in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Evaluate every constraint, reporting failures at the tracker's current path.
    pub fn evaluate(&self, object: &Map<String, Value>, tracker: &mut PathTracker) {
        for constraint in &self.constraints {
            if !constraint.condition.holds(object) {
                tracker.reject(
                    constraint.kind,
                    format!("Invalid value: \"object\": {}", constraint.message),
                );
            }
        }
    }
}

/// Compiled regular expression with its source kept for messages.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern. Fails at schema construction, never at request time.
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|e| AdmissionError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern source.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `value` matches.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Constraints on a string value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    allowed: Option<Vec<String>>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Pattern>,
}

impl StringRules {
    /// No constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an enumerated set of values.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Minimum length in characters.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Maximum length in characters.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Require a pattern match.
    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Enumerated values, if restricted.
    pub fn allowed(&self) -> Option<&[String]> {
        self.allowed.as_deref()
    }

    /// Check a value, reporting each failed rule at the current path.
    pub fn check(&self, value: &str, tracker: &mut PathTracker) {
        let path = tracker.current();

        if let Some(allowed) = &self.allowed {
            if !allowed.iter().any(|a| a == value) {
                tracker.reject(
                    ViolationKind::Format,
                    format!(
                        "Unsupported value: {value:?}: supported values: {}",
                        quoted_list(allowed)
                    ),
                );
            }
        }

        let length = value.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                tracker.reject(
                    ViolationKind::Format,
                    format!("Invalid value: {value:?}: {path} in body should be at least {min} chars long"),
                );
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                tracker.reject(
                    ViolationKind::Format,
                    format!("Too long: may not be longer than {max}"),
                );
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                tracker.reject(
                    ViolationKind::Format,
                    format!(
                        "Invalid value: {value:?}: {path} in body should match '{}'",
                        pattern.as_str()
                    ),
                );
            }
        }
    }
}

/// Constraints on an integer value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegerRules {
    allowed: Option<Vec<i64>>,
    minimum: Option<i64>,
    maximum: Option<i64>,
}

impl IntegerRules {
    /// No constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an enumerated set of values.
    pub fn one_of(mut self, values: impl IntoIterator<Item = i64>) -> Self {
        self.allowed = Some(values.into_iter().collect());
        self
    }

    /// Inclusive lower bound.
    pub fn minimum(mut self, min: i64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// Inclusive upper bound.
    pub fn maximum(mut self, max: i64) -> Self {
        self.maximum = Some(max);
        self
    }

    /// Check a JSON integer. Values past `i64::MAX` are out of range.
    pub fn check_number(&self, value: &Number, tracker: &mut PathTracker) {
        if let Some(value) = value.as_i64() {
            return self.check(value, tracker);
        }

        let path = tracker.current();
        if let Some(allowed) = &self.allowed {
            let rendered: Vec<String> = allowed.iter().map(i64::to_string).collect();
            tracker.reject(
                ViolationKind::Format,
                format!(
                    "Unsupported value: {value}: supported values: {}",
                    quoted_list(&rendered)
                ),
            );
            return;
        }
        let max = self.maximum.unwrap_or(i64::MAX);
        tracker.reject(
            ViolationKind::Format,
            format!("Invalid value: {value}: {path} in body should be less than or equal to {max}"),
        );
    }

    /// Check a value, reporting each failed rule at the current path.
    pub fn check(&self, value: i64, tracker: &mut PathTracker) {
        let path = tracker.current();

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(&value) {
                let rendered: Vec<String> = allowed.iter().map(i64::to_string).collect();
                tracker.reject(
                    ViolationKind::Format,
                    format!(
                        "Unsupported value: {value}: supported values: {}",
                        quoted_list(&rendered)
                    ),
                );
            }
        }
        if let Some(min) = self.minimum {
            if value < min {
                tracker.reject(
                    ViolationKind::Format,
                    format!("Invalid value: {value}: {path} in body should be greater than or equal to {min}"),
                );
            }
        }
        if let Some(max) = self.maximum {
            if value > max {
                tracker.reject(
                    ViolationKind::Format,
                    format!("Invalid value: {value}: {path} in body should be less than or equal to {max}"),
                );
            }
        }
    }
}

fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}
