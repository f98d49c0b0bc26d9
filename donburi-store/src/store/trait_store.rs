use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::store::types::{ListFilter, Resource};

/// Schema-keyed resource storage consulted by the storage actions.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn list(&self, schema: &str, filter: &ListFilter) -> Result<Vec<Resource>, StoreError>;

    async fn fetch(
        &self,
        schema: &str,
        id: &str,
        filter: &ListFilter,
    ) -> Result<Option<Resource>, StoreError>;

    /// Insert a resource; it must already carry its `id`.
    async fn create(&self, schema: &str, resource: Resource) -> Result<Resource, StoreError>;

    /// Merge `properties` into the stored resource and return the result.
    async fn update(
        &self,
        schema: &str,
        id: &str,
        properties: Resource,
    ) -> Result<Resource, StoreError>;

    async fn delete(&self, schema: &str, id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{schema} '{id}' not found")]
    NotFound { schema: String, id: String },
    #[error("{schema} '{id}' already exists")]
    Conflict { schema: String, id: String },
    #[error("invalid resource: {0}")]
    Invalid(String),
    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn not_found(schema: &str, id: &str) -> Self {
        StoreError::NotFound {
            schema: schema.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Invalid(e.to_string())
    }
}

/// Convert an arbitrary JSON value into a resource object.
pub fn into_resource(value: JsonValue) -> Result<Resource, StoreError> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(StoreError::Invalid(format!("expected an object, got {other}"))),
    }
}
