use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use donburi_core::EventKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted {
        run_id: Uuid,
        event: EventKind,
        tasks: usize,
    },
    RunFinished {
        run_id: Uuid,
        event: EventKind,
        /// Message of a failure that escaped the task list, if any.
        failure: Option<String>,
        /// Whether the context's error slot is set at the end of the run.
        error_recorded: bool,
        duration_ms: u64,
    },
    TaskSkipped {
        run_id: Uuid,
        task: String,
    },
    GuardFailed {
        run_id: Uuid,
        task: String,
        error: String,
    },
    AttemptStarted {
        run_id: Uuid,
        task: String,
        attempt: u32,
        attempts: u32,
    },
    AttemptSucceeded {
        run_id: Uuid,
        task: String,
        attempt: u32,
    },
    AttemptFailed {
        run_id: Uuid,
        task: String,
        attempt: u32,
        error: String,
    },
    RescueRan {
        run_id: Uuid,
        task: String,
    },
    AlwaysRan {
        run_id: Uuid,
        task: String,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "run.started",
            Event::RunFinished { .. } => "run.finished",
            Event::TaskSkipped { .. } => "task.skipped",
            Event::GuardFailed { .. } => "task.guard_failed",
            Event::AttemptStarted { .. } => "attempt.started",
            Event::AttemptSucceeded { .. } => "attempt.succeeded",
            Event::AttemptFailed { .. } => "attempt.failed",
            Event::RescueRan { .. } => "task.rescue",
            Event::AlwaysRan { .. } => "task.always",
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::RunFinished { run_id, .. }
            | Event::TaskSkipped { run_id, .. }
            | Event::GuardFailed { run_id, .. }
            | Event::AttemptStarted { run_id, .. }
            | Event::AttemptSucceeded { run_id, .. }
            | Event::AttemptFailed { run_id, .. }
            | Event::RescueRan { run_id, .. }
            | Event::AlwaysRan { run_id, .. } => *run_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut body = match self {
            Event::RunStarted { event, tasks, .. } => {
                json!({ "event": event.as_str(), "tasks": tasks })
            }
            Event::RunFinished {
                event,
                failure,
                error_recorded,
                duration_ms,
                ..
            } => json!({
                "event": event.as_str(),
                "failure": failure,
                "error_recorded": error_recorded,
                "duration_ms": duration_ms,
            }),
            Event::TaskSkipped { task, .. }
            | Event::RescueRan { task, .. }
            | Event::AlwaysRan { task, .. } => json!({ "task": task }),
            Event::GuardFailed { task, error, .. } => json!({ "task": task, "error": error }),
            Event::AttemptStarted {
                task,
                attempt,
                attempts,
                ..
            } => json!({ "task": task, "attempt": attempt, "attempts": attempts }),
            Event::AttemptSucceeded { task, attempt, .. } => {
                json!({ "task": task, "attempt": attempt })
            }
            Event::AttemptFailed {
                task, attempt, error, ..
            } => json!({ "task": task, "attempt": attempt, "error": error }),
        };
        if let Some(obj) = body.as_object_mut() {
            obj.insert("type".into(), json!(self.kind()));
            obj.insert("run_id".into(), json!(self.run_id().to_string()));
        }
        body
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// Writes one JSON object per event to stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        let mut json = event.to_json();
        if let Some(obj) = json.as_object_mut() {
            obj.insert("ts".into(), json!(chrono::Utc::now().to_rfc3339()));
        }
        println!("{}", serde_json::to_string(&json).unwrap_or_default());
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
