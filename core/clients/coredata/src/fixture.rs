//! In-memory implementation of [`CoreData`](super::CoreData) for unit tests.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;
use serde_json::Value as Json;

use acbridge_context::Context;

use super::CoreDataBackend;
use super::Filter;

/// Record of a query received by the [`CoreDataFixture`].
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRecord {
    pub filter: Filter,
    pub kind: String,
}

/// In-memory mock of the core-data service for unit tests.
///
/// Clones share the same state so tests can inspect the queries made
/// through a [`CoreData`](super::CoreData) wrapping a clone of the fixture.
#[derive(Clone, Default)]
pub struct CoreDataFixture {
    inner: Arc<Mutex<CoreDataFixtureState>>,
}

impl CoreDataFixture {
    /// Fail every query for records of the given kind with an error.
    pub fn fail_kind<S1, S2>(&self, kind: S1, message: S2)
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        self.access().failures.insert(kind.into(), message.into());
    }

    /// Add a raw record of the given kind.
    pub fn insert<S: Into<String>>(&self, kind: S, record: Json) {
        self.access()
            .records
            .entry(kind.into())
            .or_default()
            .push(record);
    }

    /// List the queries received so far, in order.
    pub fn queries(&self) -> Vec<QueryRecord> {
        self.access().queries.clone()
    }

    /// Lock and access the shared state.
    fn access(&self) -> MutexGuard<CoreDataFixtureState> {
        self.inner
            .lock()
            .expect("CoreDataFixture::inner state lock poisoned")
    }
}

#[async_trait::async_trait]
impl CoreDataBackend for CoreDataFixture {
    async fn query(&self, _: &Context, kind: &str, filter: &Filter) -> Result<Vec<Json>> {
        let mut state = self.access();
        state.queries.push(QueryRecord {
            filter: filter.clone(),
            kind: kind.to_string(),
        });
        if let Some(message) = state.failures.get(kind) {
            anyhow::bail!("{}", message);
        }
        let records = state
            .records
            .get(kind)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }
}

/// Container for the shared state.
#[derive(Default)]
struct CoreDataFixtureState {
    failures: HashMap<String, String>,
    queries: Vec<QueryRecord>,
    records: HashMap<String, Vec<Json>>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use acbridge_context::Context;

    use super::CoreDataFixture;
    use crate::CoreData;
    use crate::Filter;

    #[tokio::test]
    async fn query_filters_records() {
        let fixture = CoreDataFixture::default();
        fixture.insert("plat", json!({"bk_cloud_id": 1}));
        fixture.insert("plat", json!({"bk_cloud_id": 2}));
        let client = CoreData::from(fixture.clone());

        let context = Context::fixture();
        let filter = Filter::field_in("bk_cloud_id", [2]);
        let records = client.query(&context, "plat", &filter).await.unwrap();
        assert_eq!(records, vec![json!({"bk_cloud_id": 2})]);
        assert_eq!(fixture.queries().len(), 1);
        assert_eq!(fixture.queries()[0].kind, "plat");
    }

    #[tokio::test]
    async fn query_unknown_kind_is_empty() {
        let client = CoreData::from(CoreDataFixture::default());
        let context = Context::fixture();
        let filter = Filter::field_in("id", [1]);
        let records = client.query(&context, "host", &filter).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn query_injected_failure() {
        let fixture = CoreDataFixture::default();
        fixture.fail_kind("plat", "service unavailable");
        let client = CoreData::from(fixture);
        let context = Context::fixture();
        let filter = Filter::field_in("bk_cloud_id", [1]);
        let error = client.query(&context, "plat", &filter).await.unwrap_err();
        assert_eq!(error.to_string(), "service unavailable");
    }
}
