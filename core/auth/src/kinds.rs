//! Capability table of supported resource kinds.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use acbridge_errors::UnsupportedResourceKind;
use acbridge_models::EntityFields;
use acbridge_models::Layer;
use acbridge_models::ModelRecord;
use acbridge_models::ResourceKind;

use super::IdDecoders;

/// Kind specific knowledge needed to resolve and decode authorisation resources.
pub trait ResourceKindHandler: Send + Sync {
    /// Kind of resources handled.
    fn kind(&self) -> ResourceKind;

    /// Decoders for identifiers returned by the policy-decision service.
    fn decoders(&self) -> &IdDecoders;

    /// Attribute names of the entity records in the core-data service.
    fn entity_fields(&self) -> &EntityFields;

    /// Key of the model family classifying the entities.
    fn family_key(&self) -> &str;

    /// Ownership layers of every resource of this kind, given the resolved model.
    fn parent_layers(&self, model: &ModelRecord) -> Vec<Layer>;
}

/// Cloud platform (cloud area) resources.
///
/// Platforms are registered as common model instances with the policy-decision service,
/// so they are owned by the `plat` model.
pub struct PlatformKind {
    decoders: IdDecoders,
}

impl PlatformKind {
    const FIELDS: EntityFields = EntityFields {
        kind: "plat",
        id: "bk_cloud_id",
        name: "bk_cloud_name",
        owner: "bk_supplier_account",
    };
}

impl Default for PlatformKind {
    fn default() -> Self {
        PlatformKind {
            decoders: IdDecoders::legacy_then_bare(ResourceKind::Plat),
        }
    }
}

impl ResourceKindHandler for PlatformKind {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Plat
    }

    fn decoders(&self) -> &IdDecoders {
        &self.decoders
    }

    fn entity_fields(&self) -> &EntityFields {
        &Self::FIELDS
    }

    fn family_key(&self) -> &str {
        Self::FIELDS.kind
    }

    fn parent_layers(&self, model: &ModelRecord) -> Vec<Layer> {
        vec![Layer {
            instance_id: model.id,
            kind: ResourceKind::Model,
            name: model.object_name.clone(),
        }]
    }
}

/// Registry of [`ResourceKindHandler`]s.
#[derive(Clone)]
pub struct ResourceKinds {
    handlers: HashMap<ResourceKind, Arc<dyn ResourceKindHandler>>,
}

impl ResourceKinds {
    /// Create a [`ResourceKinds`] registry with no handlers.
    pub fn empty() -> ResourceKinds {
        ResourceKinds {
            handlers: Default::default(),
        }
    }

    /// Find the handler for a resource kind.
    pub fn lookup(&self, kind: ResourceKind) -> Result<Arc<dyn ResourceKindHandler>> {
        match self.handlers.get(&kind) {
            Some(handler) => Ok(Arc::clone(handler)),
            None => anyhow::bail!(UnsupportedResourceKind::new(kind.as_str())),
        }
    }

    /// Register a handler for the kind it reports, replacing any existing one.
    pub fn with_handler<H>(&mut self, handler: H) -> &mut Self
    where
        H: ResourceKindHandler + 'static,
    {
        let kind = handler.kind();
        self.handlers.insert(kind, Arc::new(handler));
        self
    }
}

impl Default for ResourceKinds {
    fn default() -> Self {
        let mut kinds = ResourceKinds::empty();
        kinds.with_handler(PlatformKind::default());
        kinds
    }
}
