//! The validation orchestrator and its builder.

use crate::core::defaults::{DefaultSpec, Defaulter, ResolvedDefault};
use crate::core::{Branch, DiscriminatorPolicy, FieldType, PathTracker, SchemaNode, UnionSchema};
use crate::error::{AdmissionError, Result, ViolationKind, Violations};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Builder for constructing a [`Validator`].
///
/// All schema checking happens in [`build`](Self::build): discriminator
/// fields must exist, defaults must resolve and type-check. Nothing is
/// checked per request.
///
/// # Examples
///
/// ```rust
/// use machineset_admission::core::{
///     DefaultSpec, FieldSchema, FieldType, IntegerRules, SchemaNode, Validator,
/// };
/// use serde_json::json;
///
/// let schema = SchemaNode::object("Spec").field(FieldSchema::optional(
///     "replicas",
///     FieldType::Integer(IntegerRules::new().one_of([3, 5])),
/// ));
///
/// let validator = Validator::builder(schema)
///     .with_default(DefaultSpec::new("replicas", 3))
///     .build()
///     .unwrap();
///
/// let admitted = validator.validate(&json!({})).unwrap();
/// assert_eq!(admitted, json!({"replicas": 3}));
/// ```
pub struct ValidatorBuilder {
    root: SchemaNode,
    root_path: String,
    defaults: Vec<DefaultSpec>,
}

impl ValidatorBuilder {
    /// Create a new builder around a root schema.
    pub fn new(root: SchemaNode) -> Self {
        Self {
            root,
            root_path: String::new(),
            defaults: Vec::new(),
        }
    }

    /// Dotted prefix for every reported path, e.g. `spec`.
    pub fn root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = root_path.into();
        self
    }

    /// Add a structural default, relative to the root.
    ///
    /// Structural defaults are applied in the order they are added, before
    /// any branch default.
    pub fn with_default(mut self, default: DefaultSpec) -> Self {
        self.defaults.push(default);
        self
    }

    /// Check the schema and freeze it into a validator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A union names a discriminator its node does not declare
    /// - A default path does not resolve
    /// - A default value would itself fail validation
    pub fn build(self) -> Result<Validator> {
        let mut root = self.root;
        prepare_node(&mut root)?;

        let mut structural = Vec::with_capacity(self.defaults.len());
        for default in &self.defaults {
            let (resolved, ty) = default.resolve(&root)?;
            check_default_value(default, ty, root.name())?;
            structural.push(resolved);
        }

        info!(
            schema = root.name(),
            root_path = %self.root_path,
            structural_defaults = structural.len(),
            "validator constructed"
        );

        Ok(Validator {
            root,
            root_path: self.root_path,
            structural,
        })
    }
}

/// Validates and defaults configuration objects against one frozen schema.
///
/// A `Validator` is immutable once built and holds no per-call state, so one
/// instance can serve any number of threads behind an `Arc` or a `static`.
///
/// # Examples
///
/// ```rust
/// use machineset_admission::core::{FieldSchema, FieldType, SchemaNode, Validator};
/// use serde_json::json;
///
/// let schema = SchemaNode::object("Spec")
///     .field(FieldSchema::required("zone", FieldType::string()));
/// let validator = Validator::builder(schema).root_path("spec").build().unwrap();
///
/// let violations = validator.validate(&json!({})).unwrap_err();
/// assert_eq!(violations.to_string(), "spec.zone: Required value");
/// ```
#[derive(Debug)]
pub struct Validator {
    root: SchemaNode,
    root_path: String,
    structural: Vec<ResolvedDefault>,
}

impl Validator {
    /// Create a new builder for a root schema.
    pub fn builder(root: SchemaNode) -> ValidatorBuilder {
        ValidatorBuilder::new(root)
    }

    /// Root schema.
    pub fn schema(&self) -> &SchemaNode {
        &self.root
    }

    /// Prefix of every reported path.
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Default, then validate, a candidate object.
    ///
    /// The input is never modified. On success the defaulted copy is
    /// returned; on failure every independent violation is returned in
    /// evaluation order.
    ///
    /// # Errors
    ///
    /// Returns the ordered [`Violations`] when any rule fails.
    pub fn validate(&self, raw: &Value) -> std::result::Result<Value, Violations> {
        let candidate = self.default_only(raw);

        let mut tracker = PathTracker::new(&self.root_path);
        match &candidate {
            Value::Object(object) => check_object(&self.root, object, &mut tracker),
            other => reject_type("object", other, &mut tracker),
        }

        match Violations::from_vec(tracker.into_violations()) {
            None => {
                debug!(schema = self.root.name(), "admitted");
                Ok(candidate)
            }
            Some(violations) => {
                debug!(
                    schema = self.root.name(),
                    violations = violations.len(),
                    "rejected"
                );
                Err(violations)
            }
        }
    }

    /// Apply structural and branch defaults without validating.
    pub fn default_only(&self, raw: &Value) -> Value {
        let mut candidate = raw.clone();
        Defaulter::new(&self.root, &self.structural).apply(&mut candidate);
        candidate
    }

    /// Parse JSON, then [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// The outer error is a parse failure; the inner one is the verdict.
    pub fn validate_json(
        &self,
        input: &str,
    ) -> Result<std::result::Result<Value, Violations>> {
        let raw: Value = serde_json::from_str(input)?;
        Ok(self.validate(&raw))
    }

    /// Parse YAML, then [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// The outer error is a parse failure; the inner one is the verdict.
    #[cfg(feature = "yaml")]
    pub fn validate_yaml(
        &self,
        input: &str,
    ) -> Result<std::result::Result<Value, Violations>> {
        let raw: Value = serde_yaml::from_str(input)?;
        Ok(self.validate(&raw))
    }
}

fn prepare_node(node: &mut SchemaNode) -> Result<()> {
    if let Some(union) = node.union_schema() {
        if !node.fields().iter().any(|f| f.name() == union.discriminator()) {
            return Err(AdmissionError::UnknownDiscriminatorField {
                schema: node.name().to_string(),
                discriminator: union.discriminator().to_string(),
            });
        }

        let mut resolved = Vec::with_capacity(union.registry().len());
        for branch in union.registry().branches() {
            let mut branch_defaults = Vec::with_capacity(branch.defaults().len());
            for default in branch.defaults() {
                let (compiled, ty) = default.resolve(node)?;
                check_default_value(default, ty, node.name())?;
                branch_defaults.push(compiled);
            }
            resolved.push(branch_defaults);
        }

        if let Some(union) = node.union_schema_mut() {
            for (branch, defaults) in union.registry_mut().branches_mut().zip(resolved) {
                branch.set_resolved(defaults);
                prepare_type(branch.payload_mut().ty_mut())?;
            }
        }
    }

    for field in node.fields_mut() {
        prepare_type(field.ty_mut())?;
    }
    Ok(())
}

fn prepare_type(ty: &mut FieldType) -> Result<()> {
    match ty {
        FieldType::Object(node) => prepare_node(node),
        FieldType::List(element) => prepare_type(element),
        _ => Ok(()),
    }
}

fn check_default_value(default: &DefaultSpec, ty: &FieldType, schema: &str) -> Result<()> {
    let mut tracker = PathTracker::new(default.path());
    check_value(ty, default.value(), &mut tracker);
    let violations = tracker.into_violations();
    if violations.is_empty() {
        return Ok(());
    }
    Err(AdmissionError::InvalidDefault {
        path: default.path().to_string(),
        schema: schema.to_string(),
        reason: violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    })
}

/// Type-check `value`, then run the value-level rules for `ty` and recurse.
pub(crate) fn check_value(ty: &FieldType, value: &Value, tracker: &mut PathTracker) {
    match (ty, value) {
        (FieldType::FreeForm, _) => {}
        (FieldType::String(rules), Value::String(s)) => rules.check(s, tracker),
        (FieldType::Integer(rules), Value::Number(n)) if n.is_i64() || n.is_u64() => {
            rules.check_number(n, tracker)
        }
        (FieldType::Boolean, Value::Bool(_)) => {}
        (FieldType::Object(node), Value::Object(object)) => check_object(node, object, tracker),
        (FieldType::List(element), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let mut scope = tracker.index(i);
                check_value(element, item, &mut scope);
            }
        }
        (expected, actual) => reject_type(expected.expected_name(), actual, tracker),
    }
}

fn reject_type(expected: &str, actual: &Value, tracker: &mut PathTracker) {
    let actual = json_type_name(actual);
    let path = tracker.current();
    tracker.reject(
        ViolationKind::Format,
        format!("Invalid value: {actual:?}: {path} in body must be of type {expected}: {actual:?}"),
    );
}

fn check_object(node: &SchemaNode, object: &Map<String, Value>, tracker: &mut PathTracker) {
    if let Some(min) = node.min_properties_bound() {
        let populated = object.values().filter(|v| !v.is_null()).count();
        if populated < min {
            let path = tracker.current();
            tracker.reject(
                ViolationKind::Structural,
                format!("Invalid value: {populated}: {path} in body should have at least {min} properties"),
            );
        }
    }

    let selected = match node.union_schema() {
        Some(union) => check_union(node, union, object, tracker),
        None => UnionOutcome::NotUnion,
    };

    for field in node.fields().iter().filter(|f| f.is_required()) {
        if is_absent(object, field.name()) {
            let mut scope = tracker.field(field.name());
            scope.reject(ViolationKind::Structural, "Required value");
        }
    }

    node.rules().evaluate(object, tracker);

    if let UnionOutcome::Selected(branch) = selected {
        branch.rules().evaluate(object, tracker);
    }

    for field in node.fields() {
        if let Some(child) = present(object, field.name()) {
            let mut scope = tracker.field(field.name());
            check_value(field.ty(), child, &mut scope);
        }
    }

    if let Some(values) = node.additional() {
        for (key, child) in object {
            if child.is_null() || node.lookup(key).is_some() {
                continue;
            }
            let mut scope = tracker.field(key);
            check_value(values, child, &mut scope);
        }
    }

    if let UnionOutcome::Selected(branch) = selected {
        if let Some(child) = present(object, branch.field()) {
            let mut scope = tracker.field(branch.field());
            check_value(branch.payload().ty(), child, &mut scope);
        }
    }
}

enum UnionOutcome<'s> {
    NotUnion,
    Rejected,
    Unselected,
    Selected(&'s Branch),
}

/// Exclusivity check for one union node. At most one violation.
fn check_union<'s>(
    node: &SchemaNode,
    union: &'s UnionSchema,
    object: &Map<String, Value>,
    tracker: &mut PathTracker,
) -> UnionOutcome<'s> {
    let discriminator = present(object, union.discriminator())
        .and_then(Value::as_str)
        .unwrap_or_default();
    let selected = union.registry().resolve(discriminator).ok();

    let offender = match selected {
        Some(branch) if present(object, branch.field()).is_none() => Some(branch),
        _ => union.registry().branches().find(|b| {
            selected.is_none_or(|s| s.value() != b.value()) && present(object, b.field()).is_some()
        }),
    };

    if let Some(branch) = offender {
        tracker.reject(
            ViolationKind::Structural,
            format!(
                "Invalid value: \"object\": {}",
                branch.exclusivity_message(union.discriminator())
            ),
        );
        return UnionOutcome::Rejected;
    }

    match selected {
        Some(branch) => {
            debug!(
                discriminator = union.discriminator(),
                branch = branch.value(),
                "resolved union branch"
            );
            UnionOutcome::Selected(branch)
        }
        None if discriminator.is_empty() => UnionOutcome::Unselected,
        None => {
            match union.policy() {
                DiscriminatorPolicy::FailOpen => {
                    debug!(
                        discriminator = union.discriminator(),
                        value = discriminator,
                        "no branch registered, failing open"
                    );
                }
                DiscriminatorPolicy::FailClosed if !outside_enum(node, union, discriminator) => {
                    let mut scope = tracker.field(union.discriminator());
                    scope.reject(
                        ViolationKind::UnknownDiscriminator,
                        format!(
                            "Unsupported value: {discriminator:?}: supported values: {}",
                            union.supported_values()
                        ),
                    );
                }
                DiscriminatorPolicy::FailClosed => {}
            }
            UnionOutcome::Unselected
        }
    }
}

/// Values the discriminator's own enum already rejects are not reported twice.
fn outside_enum(node: &SchemaNode, union: &UnionSchema, value: &str) -> bool {
    let allowed = node
        .lookup(union.discriminator())
        .and_then(|field| match field.ty() {
            FieldType::String(rules) => rules.allowed(),
            _ => None,
        });
    allowed.is_some_and(|allowed| !allowed.iter().any(|a| a == value))
}

fn present<'v>(object: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
    object.get(name).filter(|v| !v.is_null())
}

fn is_absent(object: &Map<String, Value>, name: &str) -> bool {
    present(object, name).is_none()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
