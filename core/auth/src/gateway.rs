use anyhow::Result;

use acbridge_clients_coredata::CoreData;
use acbridge_clients_policy::ListAuthorizedRequest;
use acbridge_clients_policy::PolicyDecision;
use acbridge_clients_policy::PLATFORM_WIDE_SCOPE;
use acbridge_conf::AuthConf;
use acbridge_context::Context;
use acbridge_errors::AuthorizationDenied;
use acbridge_errors::ResolutionFailed;
use acbridge_models::Action;
use acbridge_models::EntityRecord;
use acbridge_models::ResourceDescriptor;
use acbridge_models::ResourceKind;

use super::build_descriptors;
use super::ensure_all_found;
use super::load_entities;
use super::resolve_model;
use super::telemetry::AUTHORIZE_COUNT;
use super::telemetry::DECISION_ALLOW;
use super::telemetry::DECISION_BYPASS;
use super::telemetry::DECISION_DENY;
use super::telemetry::DECISION_ERROR;
use super::telemetry::LIST_COUNT;
use super::telemetry::LIST_ERR;
use super::ResourceKindHandler;
use super::ResourceKinds;

/// Check access to domain entities and list the entities a principal can access.
///
/// ## Disabled gateway
///
/// When the gateway is disabled every authorisation check is allowed without contacting
/// the core-data or policy-decision services.
/// Bypassed checks are logged with a `bypass` attribute and counted with the `bypass`
/// decision so they are never mistaken for checks the policy allowed.
///
/// Listing authorised resources is always delegated to the policy-decision service.
#[derive(Clone)]
pub struct AuthGateway {
    core_data: CoreData,
    enabled: bool,
    kinds: ResourceKinds,
    policy: PolicyDecision,
}

impl AuthGateway {
    /// Create a gateway for the default resource kinds.
    pub fn new(conf: &AuthConf, core_data: CoreData, policy: PolicyDecision) -> AuthGateway {
        AuthGateway {
            core_data,
            enabled: conf.enabled,
            kinds: ResourceKinds::default(),
            policy,
        }
    }

    /// Replace the table of supported resource kinds.
    pub fn with_kinds(mut self, kinds: ResourceKinds) -> AuthGateway {
        self.kinds = kinds;
        self
    }

    /// Check if authorisation checks are delegated to the policy-decision service.
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl AuthGateway {
    /// Check if an action is allowed on the entities with the given IDs.
    ///
    /// - Return `Ok` if the action is allowed (or the gateway is disabled).
    /// - Return `Err` with [`AuthorizationDenied`] if the policy denied the action.
    /// - Return `Err` with [`ResolutionFailed`] if the entities or their model could not be
    ///   resolved, including when some IDs don't match any entity.
    /// - Return `Err` with any other error if the policy-decision service failed.
    pub async fn authorize(
        &self,
        context: &Context,
        kind: ResourceKind,
        action: Action,
        ids: &[i64],
    ) -> Result<()> {
        if !self.enabled {
            return self.bypass(context, kind, action);
        }

        let handler = match self.kinds.lookup(kind) {
            Ok(handler) => handler,
            Err(error) => return self.observe(context, kind, action, Err(error)),
        };
        let entities = match self.resolve_entities(context, handler.as_ref(), ids).await {
            Ok(entities) => entities,
            Err(error) => {
                let error =
                    error.context(ResolutionFailed::new(kind.as_str(), action.as_str(), ids));
                return self.observe(context, kind, action, Err(error));
            }
        };
        self.check(context, handler.as_ref(), action, &entities).await
    }

    /// Check if an action is allowed on entities that have already been loaded.
    pub async fn authorize_entities(
        &self,
        context: &Context,
        kind: ResourceKind,
        action: Action,
        entities: &[EntityRecord],
    ) -> Result<()> {
        if !self.enabled {
            return self.bypass(context, kind, action);
        }
        let handler = match self.kinds.lookup(kind) {
            Ok(handler) => handler,
            Err(error) => return self.observe(context, kind, action, Err(error)),
        };
        self.check(context, handler.as_ref(), action, entities).await
    }

    /// Check if an action is allowed on the cloud platforms with the given IDs.
    pub async fn authorize_platforms(
        &self,
        context: &Context,
        action: Action,
        ids: &[i64],
    ) -> Result<()> {
        self.authorize(context, ResourceKind::Plat, action, ids)
            .await
    }

    /// List the IDs of entities the principal can perform the action on.
    ///
    /// IDs are returned in the order the policy-decision service lists them,
    /// with no sorting or deduplication.
    /// Fails with [`MalformedResourceID`](acbridge_errors::MalformedResourceID)
    /// if any of the identifiers can't be decoded.
    pub async fn list_authorized(
        &self,
        context: &Context,
        principal: &str,
        kind: ResourceKind,
        action: Action,
    ) -> Result<Vec<i64>> {
        LIST_COUNT.with_label_values(&[kind.as_str()]).inc();
        let result = self.list_and_decode(context, principal, kind, action).await;
        if let Err(error) = &result {
            LIST_ERR.with_label_values(&[kind.as_str()]).inc();
            slog::error!(
                context.logger, "Failed to list authorised resources";
                "principal" => principal,
                "kind" => kind.as_str(),
                "action" => action.as_str(),
                replisdk::utils::error::slog::ErrorAttributes::from(error),
            );
        }
        result
    }

    /// List the IDs of cloud platforms the user can see.
    pub async fn list_authorized_platforms(
        &self,
        context: &Context,
        username: &str,
    ) -> Result<Vec<i64>> {
        self.list_authorized(context, username, ResourceKind::Plat, Action::FindMany)
            .await
    }

    /// Describe entities as resources for the policy-decision service without checking them.
    pub async fn make_resources(
        &self,
        context: &Context,
        kind: ResourceKind,
        action: Action,
        entities: &[EntityRecord],
    ) -> Result<Vec<ResourceDescriptor>> {
        let handler = self.kinds.lookup(kind)?;
        self.describe(context, handler.as_ref(), action, entities)
            .await
    }
}

impl AuthGateway {
    /// Allow a check without asking the policy-decision service.
    fn bypass(&self, context: &Context, kind: ResourceKind, action: Action) -> Result<()> {
        AUTHORIZE_COUNT
            .with_label_values(&[kind.as_str(), DECISION_BYPASS])
            .inc();
        slog::debug!(
            context.logger, "Authorisation check bypassed because the gateway is disabled";
            "bypass" => true,
            "kind" => kind.as_str(),
            "action" => action.as_str(),
        );
        Ok(())
    }

    /// Describe the entities and ask the policy-decision service for a verdict.
    async fn check(
        &self,
        context: &Context,
        handler: &dyn ResourceKindHandler,
        action: Action,
        entities: &[EntityRecord],
    ) -> Result<()> {
        let kind = handler.kind();
        let resources = match self.describe(context, handler, action, entities).await {
            Ok(resources) => resources,
            Err(error) => {
                let ids: Vec<i64> = entities.iter().map(|entity| entity.id).collect();
                let error =
                    error.context(ResolutionFailed::new(kind.as_str(), action.as_str(), &ids));
                return self.observe(context, kind, action, Err(error));
            }
        };
        let result = self
            .policy
            .authorize(context, PLATFORM_WIDE_SCOPE, &resources, action)
            .await;
        self.observe(context, kind, action, result)
    }

    /// Resolve the model and build the resource descriptors for the entities.
    async fn describe(
        &self,
        context: &Context,
        handler: &dyn ResourceKindHandler,
        action: Action,
        entities: &[EntityRecord],
    ) -> Result<Vec<ResourceDescriptor>> {
        let model = resolve_model(context, &self.core_data, handler.family_key()).await?;
        let tenant = context.tenant_or_default();
        let resources = build_descriptors(handler, action, entities, &model, &tenant);
        Ok(resources)
    }

    /// Record the outcome of an authorisation check and return it unchanged.
    fn observe(
        &self,
        context: &Context,
        kind: ResourceKind,
        action: Action,
        result: Result<()>,
    ) -> Result<()> {
        let decision = match &result {
            Ok(()) => DECISION_ALLOW,
            Err(error) if error.is::<AuthorizationDenied>() => DECISION_DENY,
            Err(_) => DECISION_ERROR,
        };
        AUTHORIZE_COUNT
            .with_label_values(&[kind.as_str(), decision])
            .inc();
        match &result {
            Ok(()) => slog::debug!(
                context.logger, "Authorisation check allowed by policy";
                "kind" => kind.as_str(),
                "action" => action.as_str(),
            ),
            Err(error) if decision == DECISION_DENY => slog::info!(
                context.logger, "Authorisation check denied by policy";
                "kind" => kind.as_str(),
                "action" => action.as_str(),
                "reason" => error.to_string(),
            ),
            Err(error) => slog::error!(
                context.logger, "Authorisation check failed";
                "kind" => kind.as_str(),
                "action" => action.as_str(),
                replisdk::utils::error::slog::ErrorAttributes::from(error),
            ),
        };
        result
    }

    /// Ask the policy-decision service for authorised identifiers and decode them.
    async fn list_and_decode(
        &self,
        context: &Context,
        principal: &str,
        kind: ResourceKind,
        action: Action,
    ) -> Result<Vec<i64>> {
        let handler = self.kinds.lookup(kind)?;
        let request = ListAuthorizedRequest {
            action,
            principal: principal.to_string(),
            resource_type: kind,
            scope: PLATFORM_WIDE_SCOPE,
        };
        let raw = self
            .policy
            .list_authorized_resources(context, &request)
            .await?;
        handler.decoders().decode_all(raw.as_slice())
    }

    /// Load the entities and ensure all the requested IDs were found.
    async fn resolve_entities(
        &self,
        context: &Context,
        handler: &dyn ResourceKindHandler,
        ids: &[i64],
    ) -> Result<Vec<EntityRecord>> {
        let entities = load_entities(context, &self.core_data, handler, ids).await?;
        ensure_all_found(handler.kind().as_str(), ids, &entities)?;
        Ok(entities)
    }
}
