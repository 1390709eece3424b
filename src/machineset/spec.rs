//! Root schema of a control-plane machine set `spec`.

use crate::core::{
    Branch, Condition, Constraint, FieldRef, FieldSchema, FieldType, IntegerRules, SchemaNode,
    SchemaRegistry, StringRules, UnionSchema,
};
use crate::error::Result;

/// Discriminator of the template union.
pub const MACHINE_TYPE: &str = "machineType";

/// The only registered template type, also the name of its payload field.
pub const OPENSHIFT_MACHINE_V1BETA1: &str = "machines_v1beta1_machine_openshift_io";

/// Replica counts a control plane may run with.
pub const SUPPORTED_REPLICAS: [i64; 2] = [3, 5];

const ROLE_LABEL: &str = "machine.openshift.io/cluster-api-machine-role";
const TYPE_LABEL: &str = "machine.openshift.io/cluster-api-machine-type";
const CLUSTER_LABEL: &str = "machine.openshift.io/cluster-api-cluster";

/// Spec node wrapping `failure_domains` inside the machine template.
///
/// # Errors
///
/// Fails only if the template registry is malformed.
pub fn control_plane_machine_set(failure_domains: SchemaNode) -> Result<SchemaNode> {
    let strategy = SchemaNode::object("ControlPlaneMachineSetStrategy").field(FieldSchema::optional(
        "type",
        FieldType::String(StringRules::new().one_of(["RollingUpdate", "Recreate", "OnDelete"])),
    ));

    Ok(SchemaNode::object("ControlPlaneMachineSetSpec")
        .field(FieldSchema::optional(
            "replicas",
            FieldType::Integer(IntegerRules::new().one_of(SUPPORTED_REPLICAS)),
        ))
        .field(FieldSchema::optional(
            "state",
            FieldType::String(StringRules::new().one_of(["Active", "Inactive"])),
        ))
        .field(FieldSchema::optional("strategy", FieldType::Object(strategy)))
        .field(FieldSchema::required("selector", FieldType::FreeForm))
        .field(FieldSchema::required(
            "template",
            FieldType::Object(template(failure_domains)?),
        )))
}

fn template(failure_domains: SchemaNode) -> Result<SchemaNode> {
    let registry = SchemaRegistry::new().with_branch(Branch::new(
        OPENSHIFT_MACHINE_V1BETA1,
        FieldSchema::optional(
            OPENSHIFT_MACHINE_V1BETA1,
            FieldType::Object(openshift_machine_template(failure_domains)),
        ),
    ))?;

    Ok(SchemaNode::object("ControlPlaneMachineSetTemplate")
        .field(FieldSchema::required(
            MACHINE_TYPE,
            FieldType::String(StringRules::new().one_of([OPENSHIFT_MACHINE_V1BETA1])),
        ))
        .union(UnionSchema::new(MACHINE_TYPE, registry)))
}

fn openshift_machine_template(failure_domains: SchemaNode) -> SchemaNode {
    let labels = SchemaNode::map("labels", FieldType::string())
        .rule(master_label(ROLE_LABEL))
        .rule(master_label(TYPE_LABEL))
        .rule(Constraint::rule(
            Condition::Present(FieldRef::key(CLUSTER_LABEL)),
            format!("label '{CLUSTER_LABEL}' is required"),
        ));

    let metadata = SchemaNode::object("ControlPlaneMachineSetTemplateObjectMeta")
        .field(FieldSchema::required("labels", FieldType::Object(labels)))
        .field(FieldSchema::optional(
            "annotations",
            FieldType::Object(SchemaNode::map("annotations", FieldType::string())),
        ));

    SchemaNode::object("OpenShiftMachineV1Beta1MachineTemplate")
        .field(FieldSchema::optional("failureDomains", FieldType::Object(failure_domains)))
        .field(FieldSchema::required("metadata", FieldType::Object(metadata)))
        .field(FieldSchema::required("spec", FieldType::FreeForm))
}

fn master_label(label: &str) -> Constraint {
    Constraint::rule(
        Condition::equals(FieldRef::key(label), "master"),
        format!("label '{label}' is required, and must have value 'master'"),
    )
}
