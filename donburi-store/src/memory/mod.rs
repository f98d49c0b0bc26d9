use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{resource_id, ListFilter, Resource, ResourceStore, StoreError};

type Table = BTreeMap<String, Resource>;

/// In-process store keyed by schema, then by resource id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from `schema -> [resource]` pairs.
    pub fn with_resources<I>(seed: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (String, Vec<Resource>)>,
    {
        let mut tables = BTreeMap::new();
        for (schema, resources) in seed {
            let table: &mut Table = tables.entry(schema).or_default();
            for resource in resources {
                let id = resource_id(&resource)
                    .ok_or_else(|| StoreError::Invalid("resource without string id".into()))?
                    .to_string();
                table.insert(id, resource);
            }
        }
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    pub async fn len(&self, schema: &str) -> usize {
        self.tables.read().await.get(schema).map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, schema: &str) -> bool {
        self.len(schema).await == 0
    }

    /// Copy of every table, for inspection after a run.
    pub async fn snapshot(&self) -> BTreeMap<String, Vec<Resource>> {
        self.tables
            .read()
            .await
            .iter()
            .map(|(schema, table)| (schema.clone(), table.values().cloned().collect()))
            .collect()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn list(&self, schema: &str, filter: &ListFilter) -> Result<Vec<Resource>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(schema)
            .map(|t| t.values().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch(
        &self,
        schema: &str,
        id: &str,
        filter: &ListFilter,
    ) -> Result<Option<Resource>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(schema)
            .and_then(|t| t.get(id))
            .filter(|r| filter.matches(r))
            .cloned())
    }

    async fn create(&self, schema: &str, resource: Resource) -> Result<Resource, StoreError> {
        let id = resource_id(&resource)
            .ok_or_else(|| StoreError::Invalid(format!("{schema} resource without string id")))?
            .to_string();
        let mut tables = self.tables.write().await;
        let table = tables.entry(schema.to_string()).or_default();
        if table.contains_key(&id) {
            return Err(StoreError::Conflict {
                schema: schema.to_string(),
                id,
            });
        }
        table.insert(id, resource.clone());
        Ok(resource)
    }

    async fn update(
        &self,
        schema: &str,
        id: &str,
        properties: Resource,
    ) -> Result<Resource, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .get_mut(schema)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| StoreError::not_found(schema, id))?;
        for (k, v) in properties {
            stored.insert(k, v);
        }
        Ok(stored.clone())
    }

    async fn delete(&self, schema: &str, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .get_mut(schema)
            .and_then(|t| t.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(schema, id))
    }
}
