use serde_json::{Map, Value};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const CATALOG_KEY: &str = "catalog";
pub const TENANT_KEY: &str = "tenant";
pub const ITEM_KEY: &str = "item";
pub const ERROR_KEY: &str = "error";
/// Read-only name under which expressions see the triggering event.
pub const EVENT_TYPE_VAR: &str = "event_type";

/// Variable environment shared by every task of one run.
///
/// The context is handed around as `&mut Context`; nested blocks see and
/// mutate the same variables as their parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: Map<String, Value>,
    event_type: Option<&'static str>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(vars: Map<String, Value>) -> Self {
        Self {
            vars,
            event_type: None,
        }
    }

    /// Build a context from a JSON object; `null` yields an empty context.
    pub fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(vars) => Ok(Self::from_map(vars)),
            Value::Null => Ok(Self::new()),
            other => Err(other),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.vars.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.vars.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.vars.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.vars)
    }

    /// The most recent uncaught failure, if any.
    pub fn error(&self) -> Option<&Value> {
        self.vars.get(ERROR_KEY).filter(|v| !v.is_null())
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.vars
            .insert(ERROR_KEY.to_string(), Value::String(message.into()));
    }

    pub fn clear_error(&mut self) -> Option<Value> {
        self.vars.remove(ERROR_KEY)
    }

    /// Replace the current-item slot, returning the previous occupant.
    pub fn replace_item(&mut self, item: Option<Value>) -> Option<Value> {
        match item {
            Some(v) => self.vars.insert(ITEM_KEY.to_string(), v),
            None => self.vars.remove(ITEM_KEY),
        }
    }

    /// The event currently being handled; not part of the variables.
    pub fn event_type(&self) -> Option<&'static str> {
        self.event_type
    }

    pub fn set_event_type(&mut self, event_type: Option<&'static str>) {
        self.event_type = event_type;
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.vars.get(AUTH_TOKEN_KEY).and_then(Value::as_str)
    }

    /// Service catalog entries; empty when unset or not a list.
    pub fn catalog(&self) -> &[Value] {
        self.vars
            .get(CATALOG_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn tenant(&self) -> Option<&Value> {
        self.vars.get(TENANT_KEY).filter(|v| !v.is_null())
    }
}

impl From<Map<String, Value>> for Context {
    fn from(vars: Map<String, Value>) -> Self {
        Self::from_map(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_slot_round_trip() {
        let mut ctx = Context::new();
        assert!(ctx.error().is_none());
        ctx.record_error("boom");
        assert_eq!(ctx.error(), Some(&json!("boom")));
        ctx.clear_error();
        assert!(ctx.error().is_none());
    }

    #[test]
    fn replace_item_restores_previous() {
        let mut ctx = Context::from_value(json!({"item": 1})).unwrap();
        let prev = ctx.replace_item(Some(json!(2)));
        assert_eq!(prev, Some(json!(1)));
        ctx.replace_item(prev);
        assert_eq!(ctx.get("item"), Some(&json!(1)));
    }

    #[test]
    fn non_object_value_is_rejected() {
        assert!(Context::from_value(json!([1, 2])).is_err());
        assert!(Context::from_value(Value::Null).unwrap().vars().is_empty());
    }
}
