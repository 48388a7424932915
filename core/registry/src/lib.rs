//! Advertise the bridge server address with the coordination service.
//!
//! A [`ServiceRegister`] owns the lifecycle of one server registration:
//!
//! ```text
//! unregistered --register--> registered --cancel--> cancelled
//! ```
//!
//! The coordination service itself is abstracted behind the [`Coordination`] trait.
//! A Zookeeper implementation is provided by [`ZookeeperCoordination`].
use anyhow::Result;

mod register;
mod telemetry;
mod zk;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;

pub use self::register::ServiceRegister;
pub use self::telemetry::register_metrics;
pub use self::zk::ZookeeperCoordination;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::CoordinationCall;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::CoordinationFixture;

/// Operations implemented by coordination services able to hold server registrations.
///
/// Implementations are blocking: callers decide which thread they are invoked from.
pub trait Coordination: Send + Sync {
    /// Create a node at `path` with the given payload and keep it alive until cancelled.
    ///
    /// Missing parent nodes are created as needed.
    fn register_and_watch(&self, path: &str, payload: Vec<u8>) -> Result<()>;

    /// Check the coordination service is reachable.
    fn ping(&self) -> Result<()>;

    /// Stop maintaining the registration node.
    ///
    /// The node itself is not deleted.
    fn cancel(&self);

    /// Delete the node at `path`, if it exists.
    fn clear_path(&self, path: &str) -> Result<()>;
}
