//! Schema-keyed REST adapter: `rest: {schema, ...}` is routed to a per-schema
//! executor, or to [`GenericRestAction`] when none is registered. [`HeatAction`]
//! drives orchestration stacks at the endpoint found in the context's catalog.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use donburi_core::expressions::display;
use donburi_core::{Context, EventCategory};

use super::http::{encode_body, response_value};
use crate::error::TaskError;
use crate::http::{HttpClient, HttpRequest};
use crate::registry::{Action, ActionCall};

pub const AUTH_HEADER: &str = "X-Auth-Token";

pub struct RestAction {
    schemas: BTreeMap<String, Arc<dyn Action>>,
    generic: GenericRestAction,
}

impl RestAction {
    pub fn new(generic: GenericRestAction) -> Self {
        Self {
            schemas: BTreeMap::new(),
            generic,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>, action: Arc<dyn Action>) -> Self {
        self.schemas.insert(schema.into(), action);
        self
    }
}

#[async_trait]
impl Action for RestAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let Some(schema) = call.value.get("schema").and_then(Value::as_str) else {
            return Err(call.invalid("schema is required"));
        };
        match self.schemas.get(schema) {
            Some(action) => action.execute(call).await,
            None => self.generic.execute(call).await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RestParams {
    schema: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    allow_update: Vec<String>,
}

/// Maps lifecycle events onto REST calls against `{base}`:
/// creation -> `POST {base}/{schema}s`, update -> `PUT {base}/{schema}/{id}`
/// with the `allow_update` properties only, deletion -> `DELETE {base}/{schema}/{id}`.
/// Transactional variants and notifications yield `null`.
pub struct GenericRestAction {
    base: Url,
    transport: Transport,
}

impl GenericRestAction {
    pub fn new(base: Url, client: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self {
            base,
            transport: Transport { client, timeout },
        }
    }

    fn url(&self, schema: &str, id: Option<&str>) -> String {
        let base = self.base.as_str().trim_end_matches('/');
        let schema = urlencoding::encode(schema);
        match id {
            None => format!("{base}/{schema}s"),
            Some(id) => format!("{base}/{schema}/{}", urlencoding::encode(id)),
        }
    }
}

/// JSON requests carrying the context's auth token.
struct Transport {
    client: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl Transport {
    async fn send(
        &self,
        call: &ActionCall<'_>,
        method: &str,
        url: String,
        body: Option<Value>,
    ) -> Result<Value, TaskError> {
        let mut headers = BTreeMap::new();
        if let Some(token) = call.context.auth_token() {
            headers.insert(AUTH_HEADER.to_string(), token.to_string());
        }
        let body = encode_body(body, &mut headers).map_err(|e| call.invalid(e.to_string()))?;
        let req = HttpRequest {
            method: method.to_string(),
            url,
            headers,
            body,
        };
        let resp = self.client.send(req, self.timeout).await?;
        Ok(response_value(&resp))
    }
}

#[async_trait]
impl Action for GenericRestAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: RestParams = call.params()?;
        let event = call.event();
        if event.in_transaction {
            return Ok(Value::Null);
        }

        if event.category == EventCategory::PostCreate {
            let body = wrap(&params.schema, params.properties);
            return self
                .transport
                .send(&call, "POST", self.url(&params.schema, None), Some(body))
                .await;
        }

        let Some(id) = params.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(Value::Null);
        };
        match event.category {
            EventCategory::PostUpdate => {
                let update: Map<String, Value> = params
                    .allow_update
                    .iter()
                    .filter_map(|k| params.properties.get(k).map(|v| (k.clone(), v.clone())))
                    .collect();
                if update.is_empty() {
                    return Ok(Value::Null);
                }
                let body = wrap(&params.schema, update);
                self.transport
                    .send(&call, "PUT", self.url(&params.schema, Some(id)), Some(body))
                    .await
            }
            EventCategory::PreDelete => {
                self.transport
                    .send(&call, "DELETE", self.url(&params.schema, Some(id)), None)
                    .await
            }
            _ => Ok(Value::Null),
        }
    }
}

/// The remote API expects `{ "<schema>": { ...properties } }`.
fn wrap(schema: &str, properties: Map<String, Value>) -> Value {
    let mut body = Map::with_capacity(1);
    body.insert(schema.to_string(), Value::Object(properties));
    Value::Object(body)
}

const STACK_SCHEMA: &str = "stack";
const ORCHESTRATION: &str = "orchestration";
const TENANT_PLACEHOLDER: &str = "%(tenant_id)s";

#[derive(Debug, Deserialize)]
struct StackParams {
    stack_name: String,
    #[serde(default)]
    template: Value,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    allow_update: Vec<String>,
}

/// Manages an orchestration stack: creation posts `{stack_name, template}` to
/// `{endpoint}/stacks`, update and deletion address `{endpoint}/stacks/{stack_name}/{id}`.
pub struct HeatAction {
    transport: Transport,
}

impl HeatAction {
    pub fn new(client: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self {
            transport: Transport { client, timeout },
        }
    }
}

#[async_trait]
impl Action for HeatAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: StackParams = call.params()?;
        let event = call.event();
        if event.in_transaction {
            return Ok(Value::Null);
        }
        let Some(endpoint) = service_endpoint(call.context, ORCHESTRATION, "public") else {
            return Err(call.invalid("no public orchestration endpoint in the catalog"));
        };
        let stacks = format!("{}/{STACK_SCHEMA}s", endpoint.trim_end_matches('/'));

        let mut data = Map::with_capacity(2);
        data.insert("stack_name".into(), Value::String(params.stack_name.clone()));
        data.insert("template".into(), params.template);

        if event.category == EventCategory::PostCreate {
            return self
                .transport
                .send(&call, "POST", stacks, Some(Value::Object(data)))
                .await;
        }

        let Some(id) = params.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(Value::Null);
        };
        let url = format!(
            "{stacks}/{}/{}",
            urlencoding::encode(&params.stack_name),
            urlencoding::encode(id)
        );
        match event.category {
            EventCategory::PostUpdate => {
                let update: Map<String, Value> = params
                    .allow_update
                    .iter()
                    .filter_map(|k| data.get(k).map(|v| (k.clone(), v.clone())))
                    .collect();
                if update.is_empty() {
                    return Ok(Value::Null);
                }
                self.transport
                    .send(&call, "PUT", url, Some(wrap(STACK_SCHEMA, update)))
                    .await
            }
            EventCategory::PreDelete => self.transport.send(&call, "DELETE", url, None).await,
            _ => Ok(Value::Null),
        }
    }
}

/// URL of the `interface` endpoint of the catalog service of type `kind`, with
/// the tenant substituted. Catalog keys are matched in either `Type` or `type` casing.
pub fn service_endpoint(ctx: &Context, kind: &str, interface: &str) -> Option<String> {
    let url = ctx
        .catalog()
        .iter()
        .filter(|service| field(service, "Type").and_then(Value::as_str) == Some(kind))
        .filter_map(|service| field(service, "Endpoints").and_then(Value::as_array))
        .flatten()
        .filter(|ep| field(ep, "Interface").and_then(Value::as_str) == Some(interface))
        .filter_map(|ep| field(ep, "URL").and_then(Value::as_str))
        .last()?;
    let tenant = ctx.tenant().map(display).unwrap_or_default();
    Some(url.replace(TENANT_PLACEHOLDER, &tenant))
}

fn field<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    value.get(key).or_else(|| value.get(key.to_ascii_lowercase()))
}
