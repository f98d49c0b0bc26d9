use serde_json::Value;

use donburi_core::expressions::{evaluate, is_loosely_false};
use donburi_core::{Context, Task};

use super::{Engine, RunScope};
use crate::error::TaskError;
use crate::events::Event;

impl Engine {
    /// Execute one task: guard, then `retry` attempts of the body, each
    /// followed by `rescue` on failure and `always` unconditionally.
    ///
    /// Without `rescue`, a failure of the final attempt is returned to the
    /// caller after `always` has run.
    pub async fn run_task(
        &self,
        scope: RunScope,
        ctx: &mut Context,
        task: &Task,
    ) -> Result<(), TaskError> {
        let label = task.label();

        if let Some(when) = &task.when {
            match eval_guard(when, ctx) {
                Err(err) => {
                    tracing::warn!(task = label, error = %err, "guard evaluation failed");
                    ctx.record_error(err.to_string());
                    self.emit(Event::GuardFailed {
                        run_id: scope.run_id,
                        task: label.to_string(),
                        error: err.to_string(),
                    })
                    .await;
                    return Ok(());
                }
                Ok(false) => {
                    tracing::debug!(task = label, "guard is false, skipping");
                    self.emit(Event::TaskSkipped {
                        run_id: scope.run_id,
                        task: label.to_string(),
                    })
                    .await;
                    if let Some(else_tasks) = &task.else_tasks {
                        self.run_absorbing(scope, ctx, else_tasks, "else").await;
                    }
                    return Ok(());
                }
                Ok(true) => {}
            }
        }

        let attempts = task.attempts();
        let mut unrescued = None;
        for attempt in 1..=attempts {
            tracing::debug!(task = label, attempt, attempts, "attempt started");
            self.emit(Event::AttemptStarted {
                run_id: scope.run_id,
                task: label.to_string(),
                attempt,
                attempts,
            })
            .await;

            match self.run_body(scope, ctx, task).await {
                Ok(()) => {
                    unrescued = None;
                    self.emit(Event::AttemptSucceeded {
                        run_id: scope.run_id,
                        task: label.to_string(),
                        attempt,
                    })
                    .await;
                }
                Err(err) => {
                    tracing::warn!(task = label, attempt, error = %err, "attempt failed");
                    ctx.record_error(err.to_string());
                    self.emit(Event::AttemptFailed {
                        run_id: scope.run_id,
                        task: label.to_string(),
                        attempt,
                        error: err.to_string(),
                    })
                    .await;

                    match &task.rescue {
                        Some(rescue) => {
                            self.emit(Event::RescueRan {
                                run_id: scope.run_id,
                                task: label.to_string(),
                            })
                            .await;
                            self.run_absorbing(scope, ctx, rescue, "rescue").await;
                            unrescued = None;
                        }
                        None => unrescued = Some(err),
                    }
                }
            }

            if let Some(always) = &task.always {
                self.emit(Event::AlwaysRan {
                    run_id: scope.run_id,
                    task: label.to_string(),
                })
                .await;
                self.run_absorbing(scope, ctx, always, "always").await;
            }
        }

        match unrescued {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// One attempt: every action entry in document order, then `register`.
    async fn run_body(&self, scope: RunScope, ctx: &mut Context, task: &Task) -> Result<(), TaskError> {
        let mut result = Value::Null;

        for (name, raw) in &task.actions {
            if !self.registry().contains(name) {
                tracing::trace!(task = task.label(), key = %name, "ignoring unknown key");
                continue;
            }

            if !task.is_iterated() {
                result = self.dispatch(scope, ctx, name, raw).await?;
                continue;
            }

            if let Some(source) = &task.with_items {
                let items = self.resolve_items(ctx, source)?;
                result = self.invoke_items(scope, ctx, name, raw, items).await?;
            }
            if let Some(source) = &task.with_dict {
                let entries = self.resolve_dict(ctx, source)?;
                result = self.invoke_dict(scope, ctx, name, raw, entries).await?;
            }
        }

        if let Some(register) = &task.register {
            ctx.set(register.clone(), result);
        }
        Ok(())
    }

    /// Run a nested list; any failure is recorded into the error slot and dropped.
    async fn run_absorbing(&self, scope: RunScope, ctx: &mut Context, tasks: &[Task], boundary: &'static str) {
        if let Err(err) = self.run_tasks(scope.nested(), ctx, tasks).await {
            tracing::warn!(boundary, error = %err, "failure absorbed");
            ctx.record_error(err.to_string());
        }
    }
}

/// Guards are boolean literals or expression strings, read by truthiness.
fn eval_guard(when: &Value, ctx: &Context) -> Result<bool, TaskError> {
    match when {
        Value::String(expr) => evaluate(expr, ctx)
            .map(|v| !is_loosely_false(&v))
            .map_err(TaskError::Guard),
        other => Ok(!is_loosely_false(other)),
    }
}
