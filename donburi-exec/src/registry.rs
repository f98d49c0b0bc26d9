use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use donburi_core::{Context, EventKind, Task};

use crate::engine::{Engine, RunScope};
use crate::error::TaskError;

/// An executor bound to an action name.
#[async_trait]
pub trait Action: Send + Sync {
    /// Whether the value is passed through the template substitutor before dispatch.
    fn templated(&self) -> bool {
        true
    }

    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError>;
}

/// Everything an action sees for one invocation.
pub struct ActionCall<'a> {
    pub name: &'a str,
    pub scope: RunScope,
    pub context: &'a mut Context,
    pub value: Value,
    engine: &'a Engine,
}

impl<'a> ActionCall<'a> {
    pub fn new(
        engine: &'a Engine,
        scope: RunScope,
        name: &'a str,
        context: &'a mut Context,
        value: Value,
    ) -> Self {
        Self {
            name,
            scope,
            context,
            value,
            engine,
        }
    }

    pub fn event(&self) -> EventKind {
        self.scope.event
    }

    pub fn engine(&self) -> &Engine {
        self.engine
    }

    /// Run a nested task list one level deeper, sharing this call's context.
    pub async fn run_nested(&mut self, tasks: &[Task]) -> Result<(), TaskError> {
        self.engine
            .run_tasks(self.scope.nested(), self.context, tasks)
            .await
    }

    pub fn invalid(&self, message: impl Into<String>) -> TaskError {
        TaskError::invalid_params(self.name, message)
    }

    pub fn failed(&self, message: impl Into<String>) -> TaskError {
        TaskError::action(self.name, message)
    }

    /// Deserialize the call value into typed parameters.
    pub fn params<T: serde::de::DeserializeOwned>(&self) -> Result<T, TaskError> {
        serde_json::from_value(self.value.clone()).map_err(|e| self.invalid(e.to_string()))
    }
}

/// Name -> executor map. Names are unique; registering a name again replaces
/// the previous executor. There is no removal.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, action: Arc<dyn Action>) -> &mut Self {
        self.actions.insert(name.into(), action);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Action>> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Look up `name`, substitute `raw` unless the action is template-exempt,
    /// and invoke it. No guard or iteration handling happens here.
    pub async fn dispatch(
        &self,
        engine: &Engine,
        scope: RunScope,
        name: &str,
        context: &mut Context,
        raw: &Value,
    ) -> Result<Value, TaskError> {
        let action = self
            .get(name)
            .ok_or_else(|| TaskError::NoSuchAction(name.to_string()))?;
        let value = if action.templated() {
            engine.substitute(context, raw)?
        } else {
            raw.clone()
        };
        if engine.config().log_values {
            tracing::debug!(action = name, value = %value, "dispatching action");
        } else {
            tracing::debug!(action = name, "dispatching action");
        }
        action
            .execute(ActionCall::new(engine, scope, name, context, value))
            .await
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
