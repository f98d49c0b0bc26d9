mod iterate;
mod task;

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use uuid::Uuid;

use donburi_core::{Context, EventKind, Task};

use crate::config::EngineConfig;
use crate::error::{RenderError, TaskError};
use crate::events::{Event, EventSink, NoOpEventSink};
use crate::registry::ActionRegistry;
use crate::substitute::{substitute, ExpressionRenderer, TemplateRenderer};

/// Identity of one run plus the nesting level of the task list being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunScope {
    pub run_id: Uuid,
    pub event: EventKind,
    pub depth: usize,
}

impl RunScope {
    pub fn new(event: EventKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            event,
            depth: 0,
        }
    }

    pub fn nested(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

/// Interprets task lists against a context, dispatching actions through its registry.
///
/// A run is strictly sequential: each action future is awaited before the next
/// task starts, and the context is threaded through as `&mut Context`.
pub struct Engine {
    registry: Arc<ActionRegistry>,
    renderer: Arc<dyn TemplateRenderer>,
    events: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(registry: ActionRegistry) -> Self {
        Self::with_shared_registry(Arc::new(registry))
    }

    pub fn with_shared_registry(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            renderer: Arc::new(ExpressionRenderer),
            events: Arc::new(NoOpEventSink),
            config: EngineConfig::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a top-level task list for one event. Failures propagate; see
    /// [`EventBindings`](crate::EventBindings) for the absorbing boundary.
    pub async fn run(
        &self,
        event: EventKind,
        ctx: &mut Context,
        tasks: &[Task],
    ) -> Result<(), TaskError> {
        let scope = RunScope::new(event);
        let started = Instant::now();
        let previous_event = ctx.event_type();
        ctx.set_event_type(Some(event.as_str()));

        tracing::debug!(run_id = %scope.run_id, event = %event, tasks = tasks.len(), "run started");
        self.emit(Event::RunStarted {
            run_id: scope.run_id,
            event,
            tasks: tasks.len(),
        })
        .await;

        let result = self.run_tasks(scope, ctx, tasks).await;
        ctx.set_event_type(previous_event);

        let failure = result.as_ref().err().map(ToString::to_string);
        tracing::debug!(run_id = %scope.run_id, failed = failure.is_some(), "run finished");
        self.emit(Event::RunFinished {
            run_id: scope.run_id,
            event,
            failure,
            error_recorded: ctx.error().is_some(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
        .await;

        result
    }

    /// Run tasks strictly in order; the first uncaught failure stops the list.
    pub fn run_tasks<'a>(
        &'a self,
        scope: RunScope,
        ctx: &'a mut Context,
        tasks: &'a [Task],
    ) -> BoxFuture<'a, Result<(), TaskError>> {
        async move {
            if scope.depth > self.config.max_depth {
                return Err(TaskError::DepthExceeded(self.config.max_depth));
            }
            for task in tasks {
                self.run_task(scope, ctx, task).await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Explicit dispatch of one action, without guard or iteration handling.
    pub async fn dispatch(
        &self,
        scope: RunScope,
        ctx: &mut Context,
        name: &str,
        raw: &Value,
    ) -> Result<Value, TaskError> {
        self.registry.dispatch(self, scope, name, ctx, raw).await
    }

    pub fn substitute(&self, ctx: &Context, value: &Value) -> Result<Value, RenderError> {
        substitute(self.renderer.as_ref(), ctx, value)
    }

    pub(crate) async fn emit(&self, event: Event) {
        self.events.emit(event).await;
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
