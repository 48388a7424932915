//! Mock policy-decision service for unit tests.
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use acbridge_context::Context;
use acbridge_errors::AuthorizationDenied;
use acbridge_models::Action;
use acbridge_models::ResourceDescriptor;
use acbridge_models::ResourceKind;

use super::ListAuthorizedRequest;
use super::PolicyBackend;

/// Record of an authorisation request received by the [`PolicyFixture`].
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizeRecord {
    pub action: Action,
    pub resources: Vec<ResourceDescriptor>,
    pub scope: i64,
}

/// Mock policy-decision service for unit tests.
///
/// By default every action is allowed and listings are empty.
/// Clones share the same state so tests can inspect requests after the fact.
#[derive(Clone, Default)]
pub struct PolicyFixture {
    state: Arc<Mutex<PolicyFixtureState>>,
}

impl PolicyFixture {
    /// Number of authorisation requests received so far.
    pub fn authorize_calls(&self) -> usize {
        self.access().authorize.len()
    }

    /// Authorisation requests received so far, in order.
    pub fn authorize_requests(&self) -> Vec<AuthorizeRecord> {
        self.access().authorize.clone()
    }

    /// Deny any request that includes the resource instance with the given ID.
    pub fn deny_instance(&self, instance_id: i64) {
        self.access().denied.insert(instance_id);
    }

    /// Fail all authorisation requests with an error other than a denial.
    pub fn fail_authorize<S: Into<String>>(&self, message: S) {
        self.access().authorize_failure = Some(message.into());
    }

    /// Fail all listing requests with an error.
    pub fn fail_listing<S: Into<String>>(&self, message: S) {
        self.access().listing_failure = Some(message.into());
    }

    /// Number of listing requests received so far.
    pub fn listing_calls(&self) -> usize {
        self.access().listings.len()
    }

    /// Listing requests received so far, in order.
    pub fn listing_requests(&self) -> Vec<ListAuthorizedRequest> {
        self.access().listings.clone()
    }

    /// Set the identifiers returned when listing resources of a kind for a principal.
    pub fn set_authorized<S, I, V>(&self, principal: S, kind: ResourceKind, ids: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let ids = ids.into_iter().map(Into::into).collect();
        self.access().authorized.insert((principal.into(), kind), ids);
    }

    /// Lock and access the shared state.
    fn access(&self) -> MutexGuard<PolicyFixtureState> {
        self.state
            .lock()
            .expect("PolicyFixture::state lock poisoned")
    }
}

#[async_trait::async_trait]
impl PolicyBackend for PolicyFixture {
    async fn authorize(
        &self,
        _: &Context,
        scope: i64,
        resources: &[ResourceDescriptor],
        action: Action,
    ) -> Result<()> {
        let mut state = self.access();
        state.authorize.push(AuthorizeRecord {
            action,
            resources: resources.to_vec(),
            scope,
        });
        if let Some(message) = &state.authorize_failure {
            anyhow::bail!("{}", message);
        }
        let denied: Vec<String> = resources
            .iter()
            .filter(|resource| state.denied.contains(&resource.instance_id))
            .map(ToString::to_string)
            .collect();
        if !denied.is_empty() {
            let resources = format!("[{}]", denied.join(", "));
            anyhow::bail!(AuthorizationDenied::deny(action.as_str(), resources));
        }
        Ok(())
    }

    async fn list_authorized_resources(
        &self,
        _: &Context,
        request: &ListAuthorizedRequest,
    ) -> Result<Vec<String>> {
        let mut state = self.access();
        state.listings.push(request.clone());
        if let Some(message) = &state.listing_failure {
            anyhow::bail!("{}", message);
        }
        let key = (request.principal.clone(), request.resource_type);
        let ids = state.authorized.get(&key).cloned().unwrap_or_default();
        Ok(ids)
    }
}

/// Internal state to implement policy mocking.
#[derive(Default)]
struct PolicyFixtureState {
    authorize: Vec<AuthorizeRecord>,
    authorize_failure: Option<String>,
    authorized: HashMap<(String, ResourceKind), Vec<String>>,
    denied: BTreeSet<i64>,
    listing_failure: Option<String>,
    listings: Vec<ListAuthorizedRequest>,
}
