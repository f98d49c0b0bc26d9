use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use donburi_core::{Context, Document, EventKind, TaskList};

use crate::engine::Engine;

/// Handles one host event against the host-supplied context.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: EventKind, ctx: &mut Context);
}

/// Anything handlers can be registered with.
pub trait EventHost {
    fn register_handler(&mut self, event: EventKind, handler: Arc<dyn EventHandler>);
}

/// Runs a task list inside the top-level boundary: a failure that escapes the
/// list is recorded into the error slot and never re-raised.
pub struct TaskListHandler {
    engine: Arc<Engine>,
    tasks: Arc<TaskList>,
}

impl TaskListHandler {
    pub fn new(engine: Arc<Engine>, tasks: Arc<TaskList>) -> Self {
        Self { engine, tasks }
    }
}

#[async_trait]
impl EventHandler for TaskListHandler {
    async fn handle(&self, event: EventKind, ctx: &mut Context) {
        if let Err(err) = self.engine.run(event, ctx, &self.tasks).await {
            tracing::warn!(event = %event, error = %err, "task list failed");
            ctx.record_error(err.to_string());
        }
    }
}

/// Binds a document to every supported event: `tasks` to the general events,
/// `db_tasks` to the `_in_transaction` ones.
pub struct EventBindings {
    engine: Arc<Engine>,
    tasks: Arc<TaskList>,
    db_tasks: Arc<TaskList>,
}

impl EventBindings {
    pub fn new(engine: Arc<Engine>, document: Document) -> Self {
        Self {
            engine,
            tasks: Arc::new(document.tasks),
            db_tasks: Arc::new(document.db_tasks),
        }
    }

    /// Register one handler per supported event; returns how many were bound.
    pub fn bind(&self, host: &mut dyn EventHost) -> usize {
        let events = EventKind::all();
        for event in &events {
            host.register_handler(*event, Arc::new(self.handler_for(*event)));
        }
        events.len()
    }

    pub fn handler_for(&self, event: EventKind) -> TaskListHandler {
        let tasks = if event.in_transaction {
            Arc::clone(&self.db_tasks)
        } else {
            Arc::clone(&self.tasks)
        };
        TaskListHandler::new(Arc::clone(&self.engine), tasks)
    }
}

/// In-process host: event kind -> handlers, invoked in registration order.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: BTreeMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler_count(&self, event: EventKind) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    pub fn events(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.handlers.keys().copied()
    }

    /// Deliver an event; returns the number of handlers that ran.
    pub async fn dispatch(&self, event: EventKind, ctx: &mut Context) -> usize {
        let Some(handlers) = self.handlers.get(&event) else {
            tracing::debug!(event = %event, "no handlers bound");
            return 0;
        };
        for handler in handlers {
            handler.handle(event, ctx).await;
        }
        handlers.len()
    }
}

impl EventHost for EventDispatcher {
    fn register_handler(&mut self, event: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.entry(event).or_default().push(handler);
    }
}
