//! Async client interface to the external policy-decision service.
//!
//! The service renders authorisation verdicts for [`ResourceDescriptor`]s and enumerates
//! the resources a principal is allowed to access.
//! Denials are reported as [`AuthorizationDenied`](acbridge_errors::AuthorizationDenied)
//! errors so that checking access is a single `?` away.
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use acbridge_context::Context;
use acbridge_models::Action;
use acbridge_models::ResourceDescriptor;
use acbridge_models::ResourceKind;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::AuthorizeRecord;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::PolicyFixture;

/// Tenant scope for checks that apply to the whole platform instead of a single tenant.
pub const PLATFORM_WIDE_SCOPE: i64 = 0;

/// Parameters to enumerate resources a principal is allowed to access.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ListAuthorizedRequest {
    /// Action the principal must be allowed to perform.
    pub action: Action,

    /// Identity (user name) to list resources for.
    pub principal: String,

    /// Kind of resources to list.
    pub resource_type: ResourceKind,

    /// Tenant scope of the listing, [`PLATFORM_WIDE_SCOPE`] for platform resources.
    pub scope: i64,
}

/// Async API client to the policy-decision service.
#[derive(Clone)]
pub struct PolicyDecision {
    backend: Arc<dyn PolicyBackend>,
}

impl PolicyDecision {
    /// Check if an action is allowed on all the given resources.
    pub async fn authorize(
        &self,
        context: &Context,
        scope: i64,
        resources: &[ResourceDescriptor],
        action: Action,
    ) -> Result<()> {
        self.backend
            .authorize(context, scope, resources, action)
            .await
    }

    /// List the identifiers of resources a principal is allowed to access.
    ///
    /// Identifiers are returned exactly as the service encodes them.
    pub async fn list_authorized_resources(
        &self,
        context: &Context,
        request: &ListAuthorizedRequest,
    ) -> Result<Vec<String>> {
        self.backend
            .list_authorized_resources(context, request)
            .await
    }
}

impl<P> From<P> for PolicyDecision
where
    P: PolicyBackend + 'static,
{
    fn from(value: P) -> Self {
        let backend = Arc::new(value);
        PolicyDecision { backend }
    }
}

/// Interface to policy-decision service clients.
///
/// Enables implementation of clients across different transport protocols.
#[async_trait::async_trait]
pub trait PolicyBackend: Send + Sync {
    /// Check if an action is allowed on all the given resources.
    ///
    /// - Return `Ok` if the action is allowed.
    /// - Return `Err` with an [`AuthorizationDenied`](acbridge_errors::AuthorizationDenied)
    ///   error if the action is denied.
    /// - Return `Err` with any other error if the check failed (the action is still denied).
    async fn authorize(
        &self,
        context: &Context,
        scope: i64,
        resources: &[ResourceDescriptor],
        action: Action,
    ) -> Result<()>;

    /// List the identifiers of resources a principal is allowed to access.
    async fn list_authorized_resources(
        &self,
        context: &Context,
        request: &ListAuthorizedRequest,
    ) -> Result<Vec<String>>;
}
