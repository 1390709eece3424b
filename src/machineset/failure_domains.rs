//! Failure-domain schema: one branch per platform, keyed by `platform`.

use crate::core::{
    Branch, Condition, Constraint, DiscriminatorPolicy, FieldSchema, FieldType, Pattern,
    SchemaNode, SchemaRegistry, StringRules, UnionSchema,
};
use crate::error::Result;
use crate::machineset::PlatformType;

/// Discriminator field of the failure-domain union.
pub const DISCRIMINATOR: &str = "platform";

const AZURE_SUBNET_PATTERN: &str = r"^[a-zA-Z0-9](?:[a-zA-Z0-9._-]*[a-zA-Z0-9_])?$";
const OPENSTACK_ZONE_PATTERN: &str = r"^[^: ]*$";
const OPENSTACK_VOLUME_ZONE_PATTERN: &str = r"^[^ ]*$";
const NUTANIX_NAME_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Failure-domain node with every built-in platform branch registered.
///
/// # Errors
///
/// Fails only if a built-in table is malformed.
pub fn failure_domains(policy: DiscriminatorPolicy) -> Result<SchemaNode> {
    let registry = SchemaRegistry::new()
        .with_branch(branch(PlatformType::Aws, "aws", aws_domain()))?
        .with_branch(branch(PlatformType::Azure, "azure", azure_domain()?))?
        .with_branch(branch(PlatformType::Gcp, "gcp", gcp_domain()))?
        .with_branch(branch(PlatformType::OpenStack, "openstack", openstack_domain()?))?
        .with_branch(branch(PlatformType::VSphere, "vsphere", vsphere_domain()))?
        .with_branch(branch(PlatformType::Nutanix, "nutanix", nutanix_domain()?))?;

    let platforms = PlatformType::ALL.iter().map(PlatformType::as_str);

    Ok(SchemaNode::object("FailureDomains")
        .field(FieldSchema::optional(
            DISCRIMINATOR,
            FieldType::String(StringRules::new().one_of(platforms)),
        ))
        .union(UnionSchema::new(DISCRIMINATOR, registry).with_policy(policy)))
}

fn branch(platform: PlatformType, field: &str, element: SchemaNode) -> Branch {
    Branch::new(
        platform.as_str(),
        FieldSchema::optional(field, FieldType::list(FieldType::Object(element))),
    )
}

fn aws_domain() -> SchemaNode {
    let placement = SchemaNode::object("AWSFailureDomainPlacement")
        .field(FieldSchema::required("availabilityZone", FieldType::string()));

    SchemaNode::object("AWSFailureDomain")
        .min_properties(1)
        .field(FieldSchema::optional("placement", FieldType::Object(placement)))
        .field(FieldSchema::optional("subnet", FieldType::Object(aws_resource_reference())))
}

/// Reference by ID, ARN or filters. Exactly the field named by `type` is set.
fn aws_resource_reference() -> SchemaNode {
    let filter = SchemaNode::object("AWSResourceFilter")
        .field(FieldSchema::required("name", FieldType::string()))
        .field(FieldSchema::optional("values", FieldType::list(FieldType::string())));

    let mut node = SchemaNode::object("AWSResourceReference")
        .field(FieldSchema::required(
            "type",
            FieldType::String(StringRules::new().one_of(["ID", "ARN", "Filters"])),
        ))
        .field(FieldSchema::optional("id", FieldType::string()))
        .field(FieldSchema::optional("arn", FieldType::string()))
        .field(FieldSchema::optional("filters", FieldType::list(FieldType::Object(filter))));

    for (field, value) in [("id", "ID"), ("arn", "ARN"), ("filters", "Filters")] {
        node = node.rule(Constraint::required_iff(
            field,
            Condition::equals("type", value),
            format!("{field} is required when type is {value}, and forbidden otherwise"),
        ));
    }
    node
}

fn azure_domain() -> Result<SchemaNode> {
    Ok(SchemaNode::object("AzureFailureDomain")
        .field(FieldSchema::required("zone", FieldType::string()))
        .field(FieldSchema::optional(
            "subnet",
            FieldType::String(
                StringRules::new()
                    .min_length(1)
                    .max_length(80)
                    .pattern(Pattern::new(AZURE_SUBNET_PATTERN)?),
            ),
        )))
}

fn gcp_domain() -> SchemaNode {
    SchemaNode::object("GCPFailureDomain")
        .field(FieldSchema::required("zone", FieldType::string()))
}

fn openstack_domain() -> Result<SchemaNode> {
    let root_volume = SchemaNode::object("RootVolume")
        .field(FieldSchema::optional(
            "availabilityZone",
            FieldType::String(
                StringRules::new()
                    .max_length(63)
                    .pattern(Pattern::new(OPENSTACK_VOLUME_ZONE_PATTERN)?),
            ),
        ))
        .field(FieldSchema::required(
            "volumeType",
            FieldType::String(StringRules::new().min_length(1).max_length(255)),
        ));

    Ok(SchemaNode::object("OpenStackFailureDomain")
        .min_properties(1)
        .field(FieldSchema::optional(
            "availabilityZone",
            FieldType::String(
                StringRules::new()
                    .max_length(63)
                    .pattern(Pattern::new(OPENSTACK_ZONE_PATTERN)?),
            ),
        ))
        .field(FieldSchema::optional("rootVolume", FieldType::Object(root_volume)))
        .rule(Constraint::required_when(
            "rootVolume.availabilityZone",
            Condition::All(vec![
                Condition::present("availabilityZone"),
                Condition::present("rootVolume"),
            ]),
            "rootVolume.availabilityZone is required when availabilityZone is set",
        )))
}

fn vsphere_domain() -> SchemaNode {
    SchemaNode::object("VSphereFailureDomain")
        .field(FieldSchema::required("name", FieldType::string()))
}

fn nutanix_domain() -> Result<SchemaNode> {
    Ok(SchemaNode::object("NutanixFailureDomainReference").field(FieldSchema::required(
        "name",
        FieldType::String(
            StringRules::new()
                .min_length(1)
                .max_length(64)
                .pattern(Pattern::new(NUTANIX_NAME_PATTERN)?),
        ),
    )))
}
