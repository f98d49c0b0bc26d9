//! Storage actions over a [`ResourceStore`]: `list`, `fetch`, `resource`, `update`, `delete`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use donburi_store::{ListFilter, Resource, ResourceStore, StoreError};

use crate::error::TaskError;
use crate::registry::{Action, ActionCall, ActionRegistry};

/// Register the five storage actions backed by `store`.
pub fn register_storage_actions(registry: &mut ActionRegistry, store: Arc<dyn ResourceStore>) {
    registry
        .register("list", Arc::new(ListAction::new(Arc::clone(&store))))
        .register("fetch", Arc::new(FetchAction::new(Arc::clone(&store))))
        .register("resource", Arc::new(ResourceAction::new(Arc::clone(&store))))
        .register("update", Arc::new(UpdateAction::new(Arc::clone(&store))))
        .register("delete", Arc::new(DeleteAction::new(store)));
}

fn store_failure(call: &ActionCall<'_>, e: StoreError) -> TaskError {
    call.failed(e.to_string())
}

#[derive(Debug, Deserialize)]
struct ListParams {
    schema: String,
    #[serde(default)]
    tenant_id: Option<String>,
}

impl ListParams {
    fn filter(&self) -> ListFilter {
        ListFilter {
            tenant_id: self.tenant_id.clone().filter(|t| !t.is_empty()),
        }
    }
}

pub struct ListAction {
    store: Arc<dyn ResourceStore>,
}

impl ListAction {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for ListAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: ListParams = call.params()?;
        let resources = self
            .store
            .list(&params.schema, &params.filter())
            .await
            .map_err(|e| store_failure(&call, e))?;
        Ok(Value::Array(resources.into_iter().map(Value::Object).collect()))
    }
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    schema: String,
    id: String,
    #[serde(default)]
    tenant_id: Option<String>,
}

pub struct FetchAction {
    store: Arc<dyn ResourceStore>,
}

impl FetchAction {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for FetchAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: FetchParams = call.params()?;
        let filter = ListFilter {
            tenant_id: params.tenant_id.filter(|t| !t.is_empty()),
        };
        let found = self
            .store
            .fetch(&params.schema, &params.id, &filter)
            .await
            .map_err(|e| store_failure(&call, e))?;
        found
            .map(Value::Object)
            .ok_or_else(|| store_failure(&call, StoreError::not_found(&params.schema, &params.id)))
    }
}

#[derive(Debug, Deserialize)]
struct ResourceParams {
    schema: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

/// Lifecycle-aware resource handling: create on creation events, update on
/// update events, delete on deletion events, nothing on notifications.
pub struct ResourceAction {
    store: Arc<dyn ResourceStore>,
}

impl ResourceAction {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for ResourceAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: ResourceParams = call.params()?;
        let event = call.event();
        let ResourceParams {
            schema,
            id,
            mut properties,
        } = params;

        if event.is_creation() {
            let id = id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            properties.insert("id".to_string(), Value::String(id));
            let created = self
                .store
                .create(&schema, properties)
                .await
                .map_err(|e| store_failure(&call, e))?;
            return Ok(Value::Object(created));
        }

        if event.is_update() {
            let id = properties
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or(id)
                .ok_or_else(|| call.invalid("update needs properties.id or id"))?;
            let updated = self
                .store
                .update(&schema, &id, properties)
                .await
                .map_err(|e| store_failure(&call, e))?;
            return Ok(Value::Object(updated));
        }

        if event.is_deletion() {
            let id = id.ok_or_else(|| call.invalid("delete needs an id"))?;
            self.store
                .delete(&schema, &id)
                .await
                .map_err(|e| store_failure(&call, e))?;
        }
        Ok(Value::Null)
    }
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    schema: String,
    properties: Resource,
}

/// Read-modify-write of an existing resource; `null` when it does not exist.
pub struct UpdateAction {
    store: Arc<dyn ResourceStore>,
}

impl UpdateAction {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for UpdateAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: UpdateParams = call.params()?;
        let Some(id) = params.properties.get("id").and_then(Value::as_str) else {
            return Err(call.invalid("properties.id is required"));
        };
        let existing = self
            .store
            .fetch(&params.schema, id, &ListFilter::default())
            .await
            .map_err(|e| store_failure(&call, e))?;
        let Some(mut resource) = existing else {
            return Ok(Value::Null);
        };
        for (k, v) in &params.properties {
            resource.insert(k.clone(), v.clone());
        }
        let updated = self
            .store
            .update(&params.schema, id, resource)
            .await
            .map_err(|e| store_failure(&call, e))?;
        Ok(Value::Object(updated))
    }
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    schema: String,
    id: String,
}

pub struct DeleteAction {
    store: Arc<dyn ResourceStore>,
}

impl DeleteAction {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for DeleteAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: DeleteParams = call.params()?;
        self.store
            .delete(&params.schema, &params.id)
            .await
            .map_err(|e| store_failure(&call, e))?;
        Ok(Value::Null)
    }
}
