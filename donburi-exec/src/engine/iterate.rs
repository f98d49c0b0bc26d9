use serde_json::{Map, Value};

use donburi_core::context::ITEM_KEY;
use donburi_core::expressions::{evaluate, type_name};
use donburi_core::Context;

use super::{Engine, RunScope};
use crate::error::TaskError;

impl Engine {
    /// Resolve a `with_items` source: a literal list (taken as written) or an
    /// expression that yields a list.
    pub(crate) fn resolve_items(&self, ctx: &Context, source: &Value) -> Result<Vec<Value>, TaskError> {
        match self.resolve_source(ctx, source, "with_items")? {
            Value::Array(items) => Ok(items),
            other => Err(TaskError::IterationSource {
                kind: "with_items",
                message: format!("expected a list, got {}", type_name(&other)),
            }),
        }
    }

    /// Resolve a `with_dict` source: a literal mapping (taken as written) or an
    /// expression that yields a mapping.
    pub(crate) fn resolve_dict(
        &self,
        ctx: &Context,
        source: &Value,
    ) -> Result<Map<String, Value>, TaskError> {
        match self.resolve_source(ctx, source, "with_dict")? {
            Value::Object(entries) => Ok(entries),
            other => Err(TaskError::IterationSource {
                kind: "with_dict",
                message: format!("expected a mapping, got {}", type_name(&other)),
            }),
        }
    }

    fn resolve_source(&self, ctx: &Context, source: &Value, kind: &'static str) -> Result<Value, TaskError> {
        match source {
            Value::String(expr) => evaluate(expr, ctx).map_err(|e| TaskError::IterationSource {
                kind,
                message: e.to_string(),
            }),
            literal => Ok(literal.clone()),
        }
    }

    /// Invoke `name` once per element with `item` bound to it; the previous
    /// `item` value is restored afterwards, even on failure.
    pub(crate) async fn invoke_items(
        &self,
        scope: RunScope,
        ctx: &mut Context,
        name: &str,
        raw: &Value,
        items: Vec<Value>,
    ) -> Result<Value, TaskError> {
        let saved = ctx.get(ITEM_KEY).cloned();
        let mut results = Vec::with_capacity(items.len());
        let mut outcome = Ok(());
        for item in items {
            ctx.set(ITEM_KEY, item);
            match self.dispatch(scope, ctx, name, raw).await {
                Ok(v) => results.push(v),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        ctx.replace_item(saved);
        outcome.map(|()| Value::Array(results))
    }

    /// Invoke `name` once per entry with `item = {key, value}`; results are
    /// keyed by entry key.
    pub(crate) async fn invoke_dict(
        &self,
        scope: RunScope,
        ctx: &mut Context,
        name: &str,
        raw: &Value,
        entries: Map<String, Value>,
    ) -> Result<Value, TaskError> {
        let saved = ctx.get(ITEM_KEY).cloned();
        let mut results = Map::with_capacity(entries.len());
        let mut outcome = Ok(());
        for (key, value) in entries {
            let mut item = Map::with_capacity(2);
            item.insert("key".to_string(), Value::String(key.clone()));
            item.insert("value".to_string(), value);
            ctx.set(ITEM_KEY, Value::Object(item));
            match self.dispatch(scope, ctx, name, raw).await {
                Ok(v) => {
                    results.insert(key, v);
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        ctx.replace_item(saved);
        outcome.map(|()| Value::Object(results))
    }
}
