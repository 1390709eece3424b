//! Schema nodes: the shape a configuration object is validated against.

use crate::core::{IntegerRules, RuleSet, StringRules, UnionSchema};
use crate::core::rules::Constraint;

/// Type of a single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// String with optional enum, length and pattern rules.
    String(StringRules),
    /// Integer with optional enum and range rules.
    Integer(IntegerRules),
    /// Boolean.
    Boolean,
    /// Nested object.
    Object(SchemaNode),
    /// List whose elements all share one type.
    List(Box<FieldType>),
    /// Any value; not inspected.
    FreeForm,
}

impl FieldType {
    /// Unconstrained string.
    pub fn string() -> Self {
        Self::String(StringRules::new())
    }

    /// List of `element`.
    pub fn list(element: FieldType) -> Self {
        Self::List(Box::new(element))
    }

    /// Name used in type-mismatch messages.
    pub fn expected_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Boolean => "boolean",
            Self::Object(_) => "object",
            Self::List(_) => "array",
            Self::FreeForm => "any",
        }
    }
}

/// A named field on an object node.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    name: String,
    ty: FieldType,
    required: bool,
}

impl FieldSchema {
    /// Field that must be present.
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
        }
    }

    /// Field that may be absent.
    pub fn optional(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
        }
    }

    /// Field name as it appears in the object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field value type.
    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Whether absence is a violation.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// An object-shaped schema node, optionally carrying a discriminated union.
///
/// Built once with the fluent methods below, then handed to
/// [`ValidatorBuilder`](crate::core::ValidatorBuilder), which checks it and
/// freezes it for the lifetime of the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    name: String,
    fields: Vec<FieldSchema>,
    additional: Option<Box<FieldType>>,
    min_properties: Option<usize>,
    rules: RuleSet,
    union: Option<UnionSchema>,
}

impl SchemaNode {
    /// Object node with declared fields.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            additional: None,
            min_properties: None,
            rules: RuleSet::new(),
            union: None,
        }
    }

    /// Map node: any key, every value of type `values`.
    pub fn map(name: impl Into<String>, values: FieldType) -> Self {
        let mut node = Self::object(name);
        node.additional = Some(Box::new(values));
        node
    }

    /// Declare a field.
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Reject objects with fewer than `min` populated properties.
    pub fn min_properties(mut self, min: usize) -> Self {
        self.min_properties = Some(min);
        self
    }

    /// Attach a node-level constraint.
    pub fn rule(mut self, constraint: Constraint) -> Self {
        self.rules.push(constraint);
        self
    }

    /// Make this node a discriminated union.
    pub fn union(mut self, union: UnionSchema) -> Self {
        self.union = Some(union);
        self
    }

    /// Node name, used in configuration-time errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Value type for undeclared keys, if this is a map node.
    pub fn additional(&self) -> Option<&FieldType> {
        self.additional.as_deref()
    }

    /// Minimum populated properties, if declared.
    pub fn min_properties_bound(&self) -> Option<usize> {
        self.min_properties
    }

    /// Node-level constraints.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Union descriptor, if this node is a union.
    pub fn union_schema(&self) -> Option<&UnionSchema> {
        self.union.as_ref()
    }

    pub(crate) fn union_schema_mut(&mut self) -> Option<&mut UnionSchema> {
        self.union.as_mut()
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [FieldSchema] {
        &mut self.fields
    }

    /// Find a declared field or union payload by name.
    pub fn lookup(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name).or_else(|| {
            self.union
                .as_ref()
                .and_then(|u| u.registry().branches().map(|b| b.payload()).find(|p| p.name == name))
        })
    }
}

impl FieldSchema {
    pub(crate) fn ty_mut(&mut self) -> &mut FieldType {
        &mut self.ty
    }
}
