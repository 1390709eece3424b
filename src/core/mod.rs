//! Platform-agnostic validation core: paths, rules, schemas, unions and defaults.

mod defaults;
mod path;
mod registry;
pub(crate) mod rules;
mod schema;
mod validator;

pub use defaults::{DefaultSpec, Defaulter, ResolvedDefault};
pub use path::{PathSegment, PathTracker, Scope};
pub use registry::{Branch, DiscriminatorPolicy, SchemaRegistry, UnionSchema, UnknownDiscriminator};
pub use rules::{Condition, Constraint, FieldRef, IntegerRules, Pattern, RuleSet, StringRules};
pub use schema::{FieldSchema, FieldType, SchemaNode};
pub use validator::{Validator, ValidatorBuilder};
