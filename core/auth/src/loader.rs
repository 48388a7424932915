//! Batch loading of entities from the core-data service.
use std::collections::HashSet;

use anyhow::Context as _;
use anyhow::Result;

use acbridge_clients_coredata::CoreData;
use acbridge_clients_coredata::Filter;
use acbridge_context::Context;
use acbridge_errors::EntitiesNotFound;
use acbridge_errors::UpstreamQueryFailed;
use acbridge_models::EntityRecord;

use super::ResourceKindHandler;

/// Load the entities with the given IDs in a single core-data query.
///
/// IDs are deduplicated before the query and records are returned in the order
/// the core-data service returns them.
///
/// IDs that don't match any record are NOT reported as errors.
/// Callers that need all IDs to exist must check with [`ensure_all_found`].
pub async fn load_entities(
    context: &Context,
    core_data: &CoreData,
    kind: &dyn ResourceKindHandler,
    ids: &[i64],
) -> Result<Vec<EntityRecord>> {
    let ids = unique_ids(ids);
    let fields = kind.entity_fields();
    let filter = Filter::field_in(fields.id, ids.iter().copied());
    let records = match core_data.query(context, fields.kind, &filter).await {
        Ok(records) => records,
        Err(error) => {
            slog::debug!(
                context.logger, "Failed to query entities by ID";
                "kind" => fields.kind,
                replisdk::utils::error::slog::ErrorAttributes::from(&error),
            );
            let detail = format!("IDs {:?}", ids);
            return Err(error).context(UpstreamQueryFailed::new(fields.kind, detail));
        }
    };

    records
        .iter()
        .map(|record| EntityRecord::parse(fields, record))
        .collect()
}

/// Fail with [`EntitiesNotFound`] unless every requested ID has a matching entity.
pub fn ensure_all_found(kind: &str, requested: &[i64], found: &[EntityRecord]) -> Result<()> {
    let found: HashSet<i64> = found.iter().map(|entity| entity.id).collect();
    let missing: Vec<i64> = unique_ids(requested)
        .into_iter()
        .filter(|id| !found.contains(id))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!(EntitiesNotFound::new(kind, missing));
    }
    Ok(())
}

/// Remove duplicate IDs, keeping the first occurrence of each.
pub fn unique_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use acbridge_clients_coredata::CoreData;
    use acbridge_clients_coredata::CoreDataFixture;
    use acbridge_context::Context;
    use acbridge_errors::EntitiesNotFound;
    use acbridge_errors::RecordParseFailed;
    use acbridge_errors::UpstreamQueryFailed;
    use acbridge_models::EntityRecord;

    use super::ensure_all_found;
    use super::load_entities;
    use super::unique_ids;
    use crate::PlatformKind;

    fn platforms() -> CoreDataFixture {
        let fixture = CoreDataFixture::default();
        for id in 1..=3 {
            fixture.insert(
                "plat",
                json!({
                    "bk_cloud_id": id,
                    "bk_cloud_name": format!("p{}", id),
                    "bk_supplier_account": "acme",
                }),
            );
        }
        fixture
    }

    fn entity(id: i64) -> EntityRecord {
        EntityRecord {
            id,
            name: format!("p{}", id),
            owner_account: "acme".into(),
        }
    }

    #[test]
    fn unique_ids_keeps_first_occurrence() {
        assert_eq!(unique_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(unique_ids(&[]).is_empty());
    }

    #[tokio::test]
    async fn load_deduplicates_ids() {
        let fixture = platforms();
        let core_data = CoreData::from(fixture.clone());
        let context = Context::fixture();
        let kind = PlatformKind::default();

        let with_dups = load_entities(&context, &core_data, &kind, &[2, 1, 2, 1])
            .await
            .unwrap();
        let without_dups = load_entities(&context, &core_data, &kind, &[2, 1])
            .await
            .unwrap();
        assert_eq!(with_dups, without_dups);
        assert_eq!(with_dups, vec![entity(1), entity(2)]);

        let queries = fixture.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], queries[1]);
    }

    #[tokio::test]
    async fn load_ignores_missing_ids() {
        let core_data = CoreData::from(platforms());
        let context = Context::fixture();
        let kind = PlatformKind::default();
        let entities = load_entities(&context, &core_data, &kind, &[1, 42])
            .await
            .unwrap();
        assert_eq!(entities, vec![entity(1)]);
    }

    #[tokio::test]
    async fn load_parse_failure_aborts_batch() {
        let fixture = platforms();
        fixture.insert("plat", json!({"bk_cloud_id": 4, "bk_cloud_name": null}));
        let core_data = CoreData::from(fixture);
        let context = Context::fixture();
        let kind = PlatformKind::default();
        let error = load_entities(&context, &core_data, &kind, &[1, 4])
            .await
            .unwrap_err();
        assert!(error.is::<RecordParseFailed>());
    }

    #[tokio::test]
    async fn load_upstream_failure() {
        let fixture = platforms();
        fixture.fail_kind("plat", "connection refused");
        let core_data = CoreData::from(fixture.clone());
        let context = Context::fixture();
        let kind = PlatformKind::default();
        let error = load_entities(&context, &core_data, &kind, &[1])
            .await
            .unwrap_err();
        assert!(error.is::<UpstreamQueryFailed>());
        assert_eq!(error.root_cause().to_string(), "connection refused");
        assert_eq!(fixture.queries().len(), 1);
    }

    #[test]
    fn ensure_all_found_ok() {
        let found = vec![entity(1), entity(2)];
        ensure_all_found("plat", &[2, 1, 2], &found).unwrap();
    }

    #[test]
    fn ensure_all_found_reports_missing() {
        let found = vec![entity(1)];
        let error = ensure_all_found("plat", &[3, 1, 2, 3], &found).unwrap_err();
        let error = error.downcast_ref::<EntitiesNotFound>().unwrap();
        assert_eq!(error.missing, vec![3, 2]);
    }
}
