//! Default substitution for absent fields.
//!
//! A [`DefaultSpec`] is a dotted path plus a value. It is resolved against a
//! [`SchemaNode`] once, when the validator is built, into a [`ResolvedDefault`]
//! that knows which steps cross lists. Lists on the path are walked element by
//! element and never created. Missing intermediate objects are created. The
//! target is only written when it is absent or null.

use crate::core::{FieldType, SchemaNode};
use crate::error::{AdmissionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// A `(path, value)` pair applied when the path is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSpec {
    path: String,
    value: Value,
}

impl DefaultSpec {
    /// Default `value` at dotted `path`.
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Dotted target path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value written when the target is absent.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Resolve against `node`, returning the compiled default and the target's type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefault` if a segment names no field, or if a
    /// non-final segment is not an object or a list of objects.
    pub fn resolve<'s>(&self, node: &'s SchemaNode) -> Result<(ResolvedDefault, &'s FieldType)> {
        let invalid = |reason: String| AdmissionError::InvalidDefault {
            path: self.path.clone(),
            schema: node.name().to_string(),
            reason,
        };

        let segments: Vec<&str> = self.path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("path has an empty segment".to_string()));
        }

        let mut steps = Vec::with_capacity(segments.len());
        let mut current = node;
        for (i, segment) in segments.iter().enumerate() {
            let field = current
                .lookup(segment)
                .ok_or_else(|| invalid(format!("no field '{segment}' on '{}'", current.name())))?;

            if i + 1 == segments.len() {
                steps.push(Step::Set(segment.to_string()));
                let resolved = ResolvedDefault {
                    path: self.path.clone(),
                    steps,
                    value: self.value.clone(),
                };
                return Ok((resolved, field.ty()));
            }

            current = match field.ty() {
                FieldType::Object(child) => {
                    steps.push(Step::Enter(segment.to_string()));
                    child
                }
                FieldType::List(element) => match element.as_ref() {
                    FieldType::Object(child) => {
                        steps.push(Step::Each(segment.to_string()));
                        child
                    }
                    _ => return Err(invalid(format!("'{segment}' is not a list of objects"))),
                },
                _ => return Err(invalid(format!("'{segment}' is not an object"))),
            };
        }

        Err(invalid("path is empty".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Enter(String),
    Each(String),
    Set(String),
}

/// A default compiled against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDefault {
    path: String,
    steps: Vec<Step>,
    value: Value,
}

impl ResolvedDefault {
    /// Dotted path this default was declared with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Apply to `target`, returning how many slots were filled.
    pub fn apply(&self, target: &mut Value) -> usize {
        apply_steps(target, &self.steps, &self.value)
    }
}

fn apply_steps(target: &mut Value, steps: &[Step], value: &Value) -> usize {
    let Some(object) = target.as_object_mut() else {
        return 0;
    };

    match steps {
        [] => 0,
        [Step::Set(name), ..] => {
            let slot = object.entry(name.clone()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = value.clone();
                1
            } else {
                0
            }
        }
        [Step::Enter(name), rest @ ..] => {
            let child = object
                .entry(name.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if child.is_null() {
                *child = Value::Object(Map::new());
            }
            apply_steps(child, rest, value)
        }
        [Step::Each(name), rest @ ..] => match object.get_mut(name) {
            Some(Value::Array(items)) => items
                .iter_mut()
                .map(|item| apply_steps(item, rest, value))
                .sum(),
            _ => 0,
        },
    }
}

/// Applies structural defaults, then branch defaults, over a schema tree.
pub struct Defaulter<'a> {
    root: &'a SchemaNode,
    structural: &'a [ResolvedDefault],
}

impl<'a> Defaulter<'a> {
    /// Defaulter for `root` with root-relative structural defaults.
    pub fn new(root: &'a SchemaNode, structural: &'a [ResolvedDefault]) -> Self {
        Self { root, structural }
    }

    /// Fill absent fields in place. Idempotent.
    pub fn apply(&self, value: &mut Value) {
        for default in self.structural {
            if default.apply(value) > 0 {
                debug!(path = default.path(), "applied structural default");
            }
        }
        walk_node(self.root, value);
    }
}

fn walk_node(node: &SchemaNode, value: &mut Value) {
    if !value.is_object() {
        return;
    }

    let branch = node.union_schema().and_then(|union| {
        let selected = value
            .get(union.discriminator())
            .and_then(Value::as_str)
            .unwrap_or_default();
        union.registry().resolve(selected).ok()
    });

    if let Some(branch) = branch {
        for default in branch.resolved_defaults() {
            let filled = default.apply(value);
            if filled > 0 {
                debug!(
                    branch = branch.value(),
                    path = default.path(),
                    filled,
                    "applied branch default"
                );
            }
        }
    }

    let Some(object) = value.as_object_mut() else {
        return;
    };
    for field in node.fields() {
        if let Some(child) = object.get_mut(field.name()) {
            walk_type(field.ty(), child);
        }
    }
    if let Some(branch) = branch {
        if let Some(child) = object.get_mut(branch.field()) {
            walk_type(branch.payload().ty(), child);
        }
    }
}

fn walk_type(ty: &FieldType, value: &mut Value) {
    match ty {
        FieldType::Object(node) => walk_node(node, value),
        FieldType::List(element) => {
            if let Some(items) = value.as_array_mut() {
                for item in items {
                    walk_type(element, item);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldSchema, StringRules};
    use serde_json::json;

    fn schema() -> SchemaNode {
        let root_volume = SchemaNode::object("RootVolume")
            .field(FieldSchema::optional("availabilityZone", FieldType::string()))
            .field(FieldSchema::required("volumeType", FieldType::string()));
        let domain = SchemaNode::object("OpenStackFailureDomain")
            .field(FieldSchema::optional("availabilityZone", FieldType::string()))
            .field(FieldSchema::optional("rootVolume", FieldType::Object(root_volume)));

        SchemaNode::object("Spec")
            .field(FieldSchema::optional(
                "state",
                FieldType::String(StringRules::new().one_of(["Active", "Inactive"])),
            ))
            .field(FieldSchema::optional(
                "strategy",
                FieldType::Object(
                    SchemaNode::object("Strategy").field(FieldSchema::optional("type", FieldType::string())),
                ),
            ))
            .field(FieldSchema::optional(
                "domains",
                FieldType::list(FieldType::Object(domain)),
            ))
    }

    fn resolve(path: &str, value: Value) -> ResolvedDefault {
        DefaultSpec::new(path, value).resolve(&schema()).unwrap().0
    }

    #[test]
    fn test_sets_absent_leaf() {
        let mut value = json!({});
        assert_eq!(resolve("state", json!("Inactive")).apply(&mut value), 1);
        assert_eq!(value, json!({"state": "Inactive"}));
    }

    #[test]
    fn test_present_value_untouched() {
        let mut value = json!({"state": ""});
        assert_eq!(resolve("state", json!("Inactive")).apply(&mut value), 0);
        assert_eq!(value, json!({"state": ""}));
    }

    #[test]
    fn test_null_counts_as_absent() {
        let mut value = json!({"state": null});
        resolve("state", json!("Inactive")).apply(&mut value);
        assert_eq!(value, json!({"state": "Inactive"}));
    }

    #[test]
    fn test_creates_intermediate_objects() {
        let mut value = json!({});
        resolve("strategy.type", json!("RollingUpdate")).apply(&mut value);
        assert_eq!(value, json!({"strategy": {"type": "RollingUpdate"}}));
    }

    #[test]
    fn test_walks_lists_without_creating_them() {
        let default = resolve("domains.rootVolume.volumeType", json!("standard"));

        let mut absent = json!({});
        assert_eq!(default.apply(&mut absent), 0);
        assert_eq!(absent, json!({}));

        let mut value = json!({"domains": [
            {"availabilityZone": "az1"},
            {"rootVolume": {"volumeType": "fast"}}
        ]});
        assert_eq!(default.apply(&mut value), 1);
        assert_eq!(
            value,
            json!({"domains": [
                {"availabilityZone": "az1", "rootVolume": {"volumeType": "standard"}},
                {"rootVolume": {"volumeType": "fast"}}
            ]})
        );
    }

    #[test]
    fn test_apply_is_idempotent() {
        let default = resolve("strategy.type", json!("RollingUpdate"));
        let mut once = json!({"strategy": {}});
        default.apply(&mut once);
        let mut twice = once.clone();
        assert_eq!(default.apply(&mut twice), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_path_rejected() {
        let err = DefaultSpec::new("strategy.kind", json!("x"))
            .resolve(&schema())
            .unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidDefault { .. }));
        assert!(err.to_string().contains("no field 'kind' on 'Strategy'"));
    }

    #[test]
    fn test_path_through_scalar_rejected() {
        let err = DefaultSpec::new("state.value", json!("x"))
            .resolve(&schema())
            .unwrap_err();
        assert!(err.to_string().contains("'state' is not an object"));
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(DefaultSpec::new("", json!(1)).resolve(&schema()).is_err());
        assert!(DefaultSpec::new("strategy..type", json!(1)).resolve(&schema()).is_err());
    }

    #[test]
    fn test_resolve_reports_target_type() {
        let schema = schema();
        let (_, ty) = DefaultSpec::new("state", json!("Active"))
            .resolve(&schema)
            .unwrap();
        assert_eq!(ty.expected_name(), "string");
    }
}
