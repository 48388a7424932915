use acbridge_models::Action;
use acbridge_models::EntityRecord;
use acbridge_models::ModelRecord;
use acbridge_models::ResourceDescriptor;

use super::ResourceKindHandler;

/// Describe entities as authorisation resources owned by their model.
///
/// One descriptor is returned for each entity, in the same order.
/// All descriptors share the action, the tenant and the parent layers built from the model.
pub fn build_descriptors(
    kind: &dyn ResourceKindHandler,
    action: Action,
    entities: &[EntityRecord],
    model: &ModelRecord,
    tenant: &str,
) -> Vec<ResourceDescriptor> {
    let parent_layers = kind.parent_layers(model);
    entities
        .iter()
        .map(|entity| ResourceDescriptor {
            action,
            instance_id: entity.id,
            instance_name: entity.name.clone(),
            parent_layers: parent_layers.clone(),
            resource_type: kind.kind(),
            tenant: tenant.to_string(),
        })
        .collect()
}
