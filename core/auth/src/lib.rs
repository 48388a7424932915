//! Resolve domain entities into authorisation resources and check them with the
//! policy-decision service.
//!
//! An authorisation check flows through the following steps:
//!
//! 1. Load the requested entities from the core-data service in one batch ([`load_entities`]).
//! 2. Resolve the model that classifies the entities family ([`resolve_model`]).
//! 3. Describe each entity as a [`ResourceDescriptor`] owned by the model ([`build_descriptors`]).
//! 4. Ask the policy-decision service for a verdict ([`AuthGateway::authorize`]).
//!
//! The reverse direction, listing what a principal can access, asks the policy-decision
//! service for authorised identifiers and decodes them back into domain IDs
//! ([`AuthGateway::list_authorized`]).
//!
//! ## Resource kinds
//!
//! Everything that depends on the kind of resource (core-data attribute names, model family,
//! parent layers and identifier encodings) is provided by a [`ResourceKindHandler`].
//! Handlers are looked up by [`ResourceKind`](acbridge_models::ResourceKind) in a
//! [`ResourceKinds`] table so the pipeline is shared by all kinds.
//!
//! [`ResourceDescriptor`]: acbridge_models::ResourceDescriptor
mod decode;
mod descriptor;
mod gateway;
mod kinds;
mod loader;
mod model;
mod telemetry;

#[cfg(test)]
mod tests;

pub use self::decode::BareIntegerDecoder;
pub use self::decode::IdDecoder;
pub use self::decode::IdDecoders;
pub use self::decode::LegacyPrefixDecoder;
pub use self::descriptor::build_descriptors;
pub use self::gateway::AuthGateway;
pub use self::kinds::PlatformKind;
pub use self::kinds::ResourceKindHandler;
pub use self::kinds::ResourceKinds;
pub use self::loader::ensure_all_found;
pub use self::loader::load_entities;
pub use self::loader::unique_ids;
pub use self::model::resolve_model;
pub use self::telemetry::register_metrics;
