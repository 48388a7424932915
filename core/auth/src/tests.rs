use serde_json::json;

use acbridge_clients_coredata::CoreData;
use acbridge_clients_coredata::CoreDataFixture;
use acbridge_clients_coredata::Filter;
use acbridge_clients_policy::PolicyDecision;
use acbridge_clients_policy::PolicyFixture;
use acbridge_clients_policy::PLATFORM_WIDE_SCOPE;
use acbridge_conf::AuthConf;
use acbridge_context::Context;
use acbridge_errors::AuthorizationDenied;
use acbridge_errors::EntitiesNotFound;
use acbridge_errors::MalformedResourceID;
use acbridge_errors::ModelNotFound;
use acbridge_errors::ResolutionFailed;
use acbridge_errors::UnsupportedResourceKind;
use acbridge_errors::UpstreamQueryFailed;
use acbridge_models::Action;
use acbridge_models::EntityRecord;
use acbridge_models::Layer;
use acbridge_models::ResourceKind;

use crate::telemetry::AUTHORIZE_COUNT;
use crate::telemetry::DECISION_ERROR;
use crate::telemetry::LIST_COUNT;
use crate::telemetry::LIST_ERR;
use crate::AuthGateway;
use crate::ResourceKinds;

struct Fixtures {
    core_data: CoreDataFixture,
    gateway: AuthGateway,
    policy: PolicyFixture,
}

fn fixtures(enabled: bool) -> Fixtures {
    let core_data = CoreDataFixture::default();
    core_data.insert(
        "plat",
        json!({"bk_cloud_id": 1, "bk_cloud_name": "p1", "bk_supplier_account": "acme"}),
    );
    core_data.insert(
        "plat",
        json!({"bk_cloud_id": 2, "bk_cloud_name": "p2", "bk_supplier_account": "acme"}),
    );
    core_data.insert(
        "model",
        json!({"id": 9, "bk_obj_id": "plat", "bk_obj_name": "Cloud Area"}),
    );
    let policy = PolicyFixture::default();
    let conf = AuthConf { enabled };
    let gateway = AuthGateway::new(
        &conf,
        CoreData::from(core_data.clone()),
        PolicyDecision::from(policy.clone()),
    );
    Fixtures {
        core_data,
        gateway,
        policy,
    }
}

fn context() -> Context {
    Context::fixture().derive().tenant("acme").build()
}

fn model_layer() -> Layer {
    Layer {
        instance_id: 9,
        kind: ResourceKind::Model,
        name: "Cloud Area".into(),
    }
}

#[tokio::test]
async fn authorize_allowed() {
    let fixtures = fixtures(true);
    fixtures
        .gateway
        .authorize_platforms(&context(), Action::Find, &[1, 2])
        .await
        .expect("request to be authorised");

    let requests = fixtures.policy.authorize_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.action, Action::Find);
    assert_eq!(request.scope, PLATFORM_WIDE_SCOPE);

    let ids: Vec<i64> = request.resources.iter().map(|r| r.instance_id).collect();
    assert_eq!(ids, vec![1, 2]);
    for resource in &request.resources {
        assert_eq!(resource.action, Action::Find);
        assert_eq!(resource.resource_type, ResourceKind::Plat);
        assert_eq!(resource.tenant, "acme");
        assert_eq!(resource.parent_layers, vec![model_layer()]);
    }
}

#[tokio::test]
async fn authorize_denied() {
    let fixtures = fixtures(true);
    fixtures.policy.deny_instance(2);
    let error = fixtures
        .gateway
        .authorize_platforms(&context(), Action::Delete, &[1, 2])
        .await
        .unwrap_err();
    assert!(error.is::<AuthorizationDenied>());
    assert!(!error.is::<ResolutionFailed>());
}

#[tokio::test]
async fn authorize_policy_failure_is_returned_as_is() {
    let fixtures = fixtures(true);
    fixtures.policy.fail_authorize("policy service unavailable");
    let error = fixtures
        .gateway
        .authorize_platforms(&context(), Action::Find, &[1])
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "policy service unavailable");
    assert!(!error.is::<AuthorizationDenied>());
}

#[tokio::test]
async fn authorize_deduplicates_ids() {
    let fixtures = fixtures(true);
    fixtures
        .gateway
        .authorize_platforms(&context(), Action::Find, &[2, 1, 2])
        .await
        .expect("request to be authorised");

    let queries = fixtures.core_data.queries();
    let plat_query = queries.iter().find(|query| query.kind == "plat").unwrap();
    assert_eq!(plat_query.filter, Filter::field_in("bk_cloud_id", [2, 1]));
    assert_eq!(fixtures.policy.authorize_requests()[0].resources.len(), 2);
}

#[tokio::test]
async fn authorize_missing_entity() {
    let fixtures = fixtures(true);
    let error = fixtures
        .gateway
        .authorize_platforms(&context(), Action::Find, &[1, 42])
        .await
        .unwrap_err();
    assert!(error.is::<ResolutionFailed>());
    let missing = error.downcast_ref::<EntitiesNotFound>().unwrap();
    assert_eq!(missing.missing, vec![42]);
    assert_eq!(fixtures.policy.authorize_calls(), 0);
}

#[tokio::test]
async fn authorize_missing_model() {
    let core_data = CoreDataFixture::default();
    core_data.insert("plat", json!({"bk_cloud_id": 1, "bk_cloud_name": "p1"}));
    let policy = PolicyFixture::default();
    let gateway = AuthGateway::new(
        &AuthConf::default(),
        CoreData::from(core_data),
        PolicyDecision::from(policy.clone()),
    );
    let error = gateway
        .authorize_platforms(&context(), Action::Find, &[1])
        .await
        .unwrap_err();
    assert!(error.is::<ResolutionFailed>());
    assert!(error.is::<ModelNotFound>());
    assert_eq!(policy.authorize_calls(), 0);
}

#[tokio::test]
async fn authorize_upstream_failure() {
    let fixtures = fixtures(true);
    fixtures.core_data.fail_kind("plat", "connection reset");
    let error = fixtures
        .gateway
        .authorize_platforms(&context(), Action::Find, &[1])
        .await
        .unwrap_err();
    assert!(error.is::<ResolutionFailed>());
    assert!(error.is::<UpstreamQueryFailed>());
    assert_eq!(fixtures.policy.authorize_calls(), 0);
}

#[tokio::test]
async fn authorize_disabled_gateway_bypasses_services() {
    let fixtures = fixtures(false);
    fixtures.policy.deny_instance(1);
    fixtures.core_data.fail_kind("plat", "must not be queried");
    assert!(!fixtures.gateway.enabled());

    fixtures
        .gateway
        .authorize_platforms(&context(), Action::Delete, &[1, 404])
        .await
        .expect("disabled gateway to allow everything");
    let entity = EntityRecord {
        id: 1,
        name: "p1".into(),
        owner_account: "acme".into(),
    };
    fixtures
        .gateway
        .authorize_entities(&context(), ResourceKind::Plat, Action::Delete, &[entity])
        .await
        .expect("disabled gateway to allow everything");

    assert_eq!(fixtures.policy.authorize_calls(), 0);
    assert!(fixtures.core_data.queries().is_empty());
}

#[tokio::test]
async fn authorize_loaded_entities() {
    let fixtures = fixtures(true);
    let entity = EntityRecord {
        id: 7,
        name: "p7".into(),
        owner_account: "acme".into(),
    };
    fixtures
        .gateway
        .authorize_entities(&context(), ResourceKind::Plat, Action::Update, &[entity])
        .await
        .expect("request to be authorised");

    let queries = fixtures.core_data.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].kind, "model");
    assert_eq!(fixtures.policy.authorize_requests()[0].resources[0].instance_id, 7);
}

#[tokio::test]
async fn authorize_unsupported_kind() {
    let fixtures = fixtures(true);
    let gateway = fixtures.gateway.with_kinds(ResourceKinds::empty());
    let error = gateway
        .authorize_platforms(&context(), Action::Find, &[1])
        .await
        .unwrap_err();
    assert!(error.is::<UnsupportedResourceKind>());
}

#[tokio::test]
async fn authorize_unsupported_kind_counts_as_error() {
    let fixtures = fixtures(true);
    let errors = AUTHORIZE_COUNT.with_label_values(&["model", DECISION_ERROR]);
    let before = errors.get();
    let error = fixtures
        .gateway
        .authorize(&context(), ResourceKind::Model, Action::Find, &[9])
        .await
        .unwrap_err();
    assert!(error.is::<UnsupportedResourceKind>());
    let entity = EntityRecord {
        id: 9,
        name: "Cloud Area".into(),
        owner_account: "acme".into(),
    };
    let error = fixtures
        .gateway
        .authorize_entities(&context(), ResourceKind::Model, Action::Find, &[entity])
        .await
        .unwrap_err();
    assert!(error.is::<UnsupportedResourceKind>());
    assert_eq!(errors.get() - before, 2.0);
    assert_eq!(fixtures.policy.authorize_calls(), 0);
}

#[tokio::test]
async fn list_authorized_unsupported_kind_counts_as_error() {
    let fixtures = fixtures(true);
    let listings = LIST_COUNT.with_label_values(&["model"]);
    let errors = LIST_ERR.with_label_values(&["model"]);
    let (listings_before, errors_before) = (listings.get(), errors.get());
    let error = fixtures
        .gateway
        .list_authorized(&context(), "alice", ResourceKind::Model, Action::FindMany)
        .await
        .unwrap_err();
    assert!(error.is::<UnsupportedResourceKind>());
    assert_eq!(listings.get() - listings_before, 1.0);
    assert_eq!(errors.get() - errors_before, 1.0);
    assert_eq!(fixtures.policy.listing_calls(), 0);
}

#[tokio::test]
async fn make_resources_end_to_end() {
    let fixtures = fixtures(true);
    let entities = vec![
        EntityRecord {
            id: 1,
            name: "p1".into(),
            owner_account: "acme".into(),
        },
        EntityRecord {
            id: 2,
            name: "p2".into(),
            owner_account: "acme".into(),
        },
    ];
    let resources = fixtures
        .gateway
        .make_resources(&context(), ResourceKind::Plat, Action::Find, &entities)
        .await
        .unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].instance_id, 1);
    assert_eq!(resources[0].instance_name, "p1");
    assert_eq!(resources[1].instance_id, 2);
    assert_eq!(resources[1].instance_name, "p2");
    for resource in &resources {
        assert_eq!(resource.tenant, "acme");
        assert_eq!(resource.parent_layers, vec![model_layer()]);
    }
    assert_eq!(fixtures.policy.authorize_calls(), 0);
}

#[tokio::test]
async fn list_authorized_mixed_encodings() {
    let fixtures = fixtures(true);
    fixtures
        .policy
        .set_authorized("alice", ResourceKind::Plat, ["plat:5", "7", "plat:9"]);
    let ids = fixtures
        .gateway
        .list_authorized_platforms(&context(), "alice")
        .await
        .unwrap();
    assert_eq!(ids, vec![5, 7, 9]);

    let requests = fixtures.policy.listing_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].action, Action::FindMany);
    assert_eq!(requests[0].principal, "alice");
    assert_eq!(requests[0].resource_type, ResourceKind::Plat);
    assert_eq!(requests[0].scope, PLATFORM_WIDE_SCOPE);
}

#[tokio::test]
async fn list_authorized_keeps_duplicates() {
    let fixtures = fixtures(true);
    fixtures
        .policy
        .set_authorized("alice", ResourceKind::Plat, ["3", "plat:3", "1"]);
    let ids = fixtures
        .gateway
        .list_authorized(&context(), "alice", ResourceKind::Plat, Action::Find)
        .await
        .unwrap();
    assert_eq!(ids, vec![3, 3, 1]);
}

#[tokio::test]
async fn list_authorized_malformed_id() {
    for raw in ["plat:", "plat:x"] {
        let fixtures = fixtures(true);
        fixtures
            .policy
            .set_authorized("alice", ResourceKind::Plat, ["1", raw, "2"]);
        let error = fixtures
            .gateway
            .list_authorized_platforms(&context(), "alice")
            .await
            .unwrap_err();
        let malformed = error.downcast_ref::<MalformedResourceID>().unwrap();
        assert_eq!(malformed.raw, raw);
    }
}

#[tokio::test]
async fn list_authorized_policy_failure() {
    let fixtures = fixtures(true);
    fixtures.policy.fail_listing("listing failed");
    let error = fixtures
        .gateway
        .list_authorized_platforms(&context(), "alice")
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "listing failed");
}

#[tokio::test]
async fn list_authorized_ignores_disabled_switch() {
    let fixtures = fixtures(false);
    fixtures
        .policy
        .set_authorized("bob", ResourceKind::Plat, ["plat:1"]);
    let ids = fixtures
        .gateway
        .list_authorized_platforms(&context(), "bob")
        .await
        .unwrap();
    assert_eq!(ids, vec![1]);
    assert_eq!(fixtures.policy.listing_calls(), 1);
}

#[test]
fn register_metrics_once() {
    let registry = prometheus::Registry::new();
    crate::register_metrics(&registry).unwrap();
    crate::register_metrics(&registry).unwrap();
}
