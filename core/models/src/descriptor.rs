//! Normalised authorisation resources submitted to the policy-decision service.
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::Action;

/// Kinds of resources known to the policy-decision service.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// The model classifying a family of entities.
    Model,

    /// A cloud platform (cloud area) record.
    Plat,
}

impl ResourceKind {
    /// Wire name of the resource kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Model => "model",
            ResourceKind::Plat => "plat",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layer of the ownership hierarchy a resource belongs to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub instance_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

/// Resource, and the action on it, to obtain an authorisation verdict for.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Action requested on the resource.
    pub action: Action,

    /// Identifier of the resource instance.
    pub instance_id: i64,

    /// Display name of the resource instance.
    pub instance_name: String,

    /// Ownership layers the resource belongs to, outermost first.
    pub parent_layers: Vec<Layer>,

    /// Kind of the resource.
    pub resource_type: ResourceKind,

    /// Account (tenant) the request is performed for.
    pub tenant: String,
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.instance_id)
    }
}
