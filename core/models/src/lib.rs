//! Data models shared by the access-control bridge components.
//!
//! - Domain records ([`EntityRecord`], [`ModelRecord`]) parsed from core-data responses.
//! - Authorisation resources ([`ResourceDescriptor`]) submitted to the policy-decision service.
//! - Server registration information ([`ServerInfo`]).
mod action;
mod descriptor;
mod record;
mod server;

pub use self::action::Action;
pub use self::descriptor::Layer;
pub use self::descriptor::ResourceDescriptor;
pub use self::descriptor::ResourceKind;
pub use self::record::EntityFields;
pub use self::record::EntityRecord;
pub use self::record::ModelRecord;
pub use self::server::ServerInfo;
