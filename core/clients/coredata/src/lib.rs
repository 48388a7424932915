//! Read-only access to records stored by the core-data service.
//!
//! The bridge never writes records: it queries entities and models by kind
//! with a [`Filter`] and receives raw JSON records back.
//! Parsing the records into typed models is left to the callers.
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value as Json;

use acbridge_context::Context;

mod filter;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::CoreDataFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::QueryRecord;

pub use self::filter::Filter;

/// Query records from the core-data service.
#[derive(Clone)]
pub struct CoreData {
    /// Runtime configured client for the core-data service.
    inner: Arc<dyn CoreDataBackend>,
}

impl CoreData {
    /// Query all records of the given kind matching the filter.
    ///
    /// Records are returned in the order the core-data service provides them.
    pub async fn query(&self, context: &Context, kind: &str, filter: &Filter) -> Result<Vec<Json>> {
        self.inner.query(context, kind, filter).await
    }
}

impl<T> From<T> for CoreData
where
    T: CoreDataBackend + 'static,
{
    fn from(value: T) -> Self {
        CoreData {
            inner: Arc::new(value),
        }
    }
}

/// Operations implemented by core-data service clients.
#[async_trait::async_trait]
pub trait CoreDataBackend: Send + Sync {
    /// Query all records of the given kind matching the filter.
    async fn query(&self, context: &Context, kind: &str, filter: &Filter) -> Result<Vec<Json>>;
}
