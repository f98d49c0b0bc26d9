//! Built-ins that operate on the engine itself: nested lists, expressions and variables.

use async_trait::async_trait;
use serde_json::Value;

use donburi_core::expressions::execute;
use donburi_core::Task;

use crate::error::TaskError;
use crate::registry::{Action, ActionCall};

fn task_list(call: &ActionCall<'_>) -> Result<Vec<Task>, TaskError> {
    match &call.value {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => call.params(),
        other => Err(call.invalid(format!("expected a task list, got {other}"))),
    }
}

/// Runs its value as a nested task list against the same context.
pub struct BlockAction;

#[async_trait]
impl Action for BlockAction {
    fn templated(&self) -> bool {
        false
    }

    async fn execute(&self, mut call: ActionCall<'_>) -> Result<Value, TaskError> {
        let tasks = task_list(&call)?;
        call.run_nested(&tasks).await?;
        Ok(Value::Null)
    }
}

/// Like `block`, but runs the list in reverse for deletion-phase events so
/// dependents are torn down before what they depend on.
pub struct ResourcesAction;

#[async_trait]
impl Action for ResourcesAction {
    fn templated(&self) -> bool {
        false
    }

    async fn execute(&self, mut call: ActionCall<'_>) -> Result<Value, TaskError> {
        let mut tasks = task_list(&call)?;
        if call.event().is_deletion() {
            tasks.reverse();
        }
        call.run_nested(&tasks).await?;
        Ok(Value::Null)
    }
}

/// Evaluates an expression or assignment statement; the raw string is never templated.
pub struct EvalAction;

#[async_trait]
impl Action for EvalAction {
    fn templated(&self) -> bool {
        false
    }

    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let Value::String(code) = &call.value else {
            return Err(call.invalid("expected an expression string"));
        };
        Ok(execute(code, call.context)?)
    }
}

/// Merges a mapping into the context.
pub struct VarsAction;

#[async_trait]
impl Action for VarsAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let Value::Object(vars) = call.value else {
            return Err(TaskError::invalid_params(call.name, "expected a mapping"));
        };
        for (k, v) in vars {
            call.context.set(k, v);
        }
        Ok(Value::Null)
    }
}
