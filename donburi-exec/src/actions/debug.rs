use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use donburi_core::expressions::display;

use crate::error::TaskError;
use crate::registry::{Action, ActionCall};

/// Logs its value at INFO.
pub struct DebugAction;

#[async_trait]
impl Action for DebugAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        tracing::info!(run_id = %call.scope.run_id, event = %call.event(), "{}", display(&call.value));
        Ok(Value::Null)
    }
}

/// Waits for the given number of milliseconds.
pub struct SleepAction;

#[async_trait]
impl Action for SleepAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let millis = match &call.value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .ok_or_else(|| call.invalid("expected a non-negative number of milliseconds"))?;
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(Value::Null)
    }
}

/// Raises a failure carrying its value as the message.
pub struct FailAction;

#[async_trait]
impl Action for FailAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let message = match display(&call.value) {
            m if m.is_empty() => "failed".to_string(),
            m => m,
        };
        Err(TaskError::Raised(message))
    }
}
