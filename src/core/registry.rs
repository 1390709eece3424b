//! Discriminator-keyed branch registry for union nodes.

use crate::core::defaults::{DefaultSpec, ResolvedDefault};
use crate::core::{FieldSchema, RuleSet};
use crate::error::{AdmissionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do when a discriminator names no registered branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscriminatorPolicy {
    /// Accept, applying no branch rules or defaults.
    #[default]
    FailOpen,
    /// Reject non-empty values with no branch.
    FailClosed,
}

/// Returned by [`SchemaRegistry::resolve`] for a value with no branch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no branch registered for discriminator value '{0}'")]
pub struct UnknownDiscriminator(pub String);

/// One arm of a discriminated union.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    value: String,
    payload: FieldSchema,
    rules: RuleSet,
    defaults: Vec<DefaultSpec>,
    resolved: Vec<ResolvedDefault>,
}

impl Branch {
    /// Branch selected by `value`, carried in `payload`.
    pub fn new(value: impl Into<String>, payload: FieldSchema) -> Self {
        Self {
            value: value.into(),
            payload,
            rules: RuleSet::new(),
            defaults: Vec::new(),
            resolved: Vec::new(),
        }
    }

    /// Constraints evaluated on the union node when this branch is selected.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Default applied, relative to the union node, when this branch is selected.
    pub fn with_default(mut self, default: DefaultSpec) -> Self {
        self.defaults.push(default);
        self
    }

    /// Discriminator value selecting this branch.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Payload field name.
    pub fn field(&self) -> &str {
        self.payload.name()
    }

    /// Payload field schema.
    pub fn payload(&self) -> &FieldSchema {
        &self.payload
    }

    /// Branch-level constraints.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Declared defaults.
    pub fn defaults(&self) -> &[DefaultSpec] {
        &self.defaults
    }

    /// Merged exclusivity message for this branch.
    pub fn exclusivity_message(&self, discriminator: &str) -> String {
        format!(
            "{} configuration is required when {} is {}, and forbidden otherwise",
            self.field(),
            discriminator,
            self.value
        )
    }

    pub(crate) fn push_default(&mut self, default: DefaultSpec) {
        self.defaults.push(default);
    }

    pub(crate) fn resolved_defaults(&self) -> &[ResolvedDefault] {
        &self.resolved
    }

    pub(crate) fn set_resolved(&mut self, resolved: Vec<ResolvedDefault>) {
        self.resolved = resolved;
    }

    pub(crate) fn payload_mut(&mut self) -> &mut FieldSchema {
        &mut self.payload
    }
}

/// Ordered map from discriminator value to [`Branch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    branches: Vec<Branch>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a branch.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateBranch` if the value or payload field is already taken,
    /// or if the value is empty.
    pub fn register(&mut self, branch: Branch) -> Result<()> {
        let duplicate = branch.value.is_empty()
            || self.index.contains_key(&branch.value)
            || self.branches.iter().any(|b| b.field() == branch.field());
        if duplicate {
            return Err(AdmissionError::DuplicateBranch {
                branch: branch.value.clone(),
                field: branch.field().to_string(),
            });
        }

        self.index.insert(branch.value.clone(), self.branches.len());
        self.branches.push(branch);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_branch(mut self, branch: Branch) -> Result<Self> {
        self.register(branch)?;
        Ok(self)
    }

    /// Look up the branch for a discriminator value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDiscriminator` when nothing is registered for `value`.
    /// The empty value never resolves.
    pub fn resolve(&self, value: &str) -> std::result::Result<&Branch, UnknownDiscriminator> {
        self.index
            .get(value)
            .map(|&i| &self.branches[i])
            .ok_or_else(|| UnknownDiscriminator(value.to_string()))
    }

    /// Branches in registration order.
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    /// Registered discriminator values in registration order.
    pub fn values(&self) -> Vec<&str> {
        self.branches.iter().map(Branch::value).collect()
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// True when no branches are registered.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub(crate) fn branches_mut(&mut self) -> impl Iterator<Item = &mut Branch> {
        self.branches.iter_mut()
    }
}

/// Union descriptor attached to a [`SchemaNode`](crate::core::SchemaNode).
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    discriminator: String,
    registry: SchemaRegistry,
    policy: DiscriminatorPolicy,
}

impl UnionSchema {
    /// Union keyed by the sibling field `discriminator`.
    pub fn new(discriminator: impl Into<String>, registry: SchemaRegistry) -> Self {
        Self {
            discriminator: discriminator.into(),
            registry,
            policy: DiscriminatorPolicy::default(),
        }
    }

    /// Set the unknown-discriminator policy.
    pub fn with_policy(mut self, policy: DiscriminatorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Discriminator field name.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Branch registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Unknown-discriminator policy.
    pub fn policy(&self) -> DiscriminatorPolicy {
        self.policy
    }

    /// Supported values message fragment, e.g. `"AWS", "GCP"`.
    pub fn supported_values(&self) -> String {
        self.registry
            .values()
            .iter()
            .map(|v| format!("{v:?}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }
}
