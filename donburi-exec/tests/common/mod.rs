#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use donburi_core::{parse_document_str, Document, DocumentFormat, EventCategory, EventKind, Task};
use donburi_exec::actions::builtin_registry;
use donburi_exec::{Action, ActionCall, ActionRegistry, Engine, Event, EventSink, TaskError};

pub const POST_CREATE: EventKind = EventKind::general(EventCategory::PostCreate);
pub const PRE_DELETE: EventKind = EventKind::general(EventCategory::PreDelete);

pub fn document(yaml: &str) -> Document {
    parse_document_str(yaml, DocumentFormat::Yaml).unwrap().document
}

pub fn tasks(yaml: &str) -> Vec<Task> {
    document(yaml).tasks
}

/// Records every value it receives together with the current `item`.
#[derive(Default)]
pub struct Probe {
    calls: Mutex<Vec<(Value, Option<Value>)>>,
}

impl Probe {
    pub fn values(&self) -> Vec<Value> {
        self.calls.lock().unwrap().iter().map(|(v, _)| v.clone()).collect()
    }

    pub fn items(&self) -> Vec<Option<Value>> {
        self.calls.lock().unwrap().iter().map(|(_, i)| i.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Action for Probe {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let item = call.context.get("item").cloned();
        self.calls.lock().unwrap().push((call.value.clone(), item));
        Ok(call.value)
    }
}

/// Fails the first `failures` invocations, then succeeds.
pub struct Flaky {
    failures: usize,
    seen: AtomicUsize,
}

impl Flaky {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            seen: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Action for Flaky {
    async fn execute(&self, _call: ActionCall<'_>) -> Result<Value, TaskError> {
        let n = self.seen.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(TaskError::Raised(format!("flaky failure {}", n + 1)))
        } else {
            Ok(Value::String("ok".into()))
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(Event::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub engine: Engine,
    pub probe: Arc<Probe>,
    pub sink: Arc<RecordingSink>,
}

pub fn harness() -> Harness {
    harness_with(builtin_registry())
}

pub fn harness_with(mut registry: ActionRegistry) -> Harness {
    let probe = Arc::new(Probe::default());
    registry.register("probe", probe.clone());
    let sink = Arc::new(RecordingSink::default());
    let engine = Engine::new(registry).with_event_sink(sink.clone());
    Harness {
        engine,
        probe,
        sink,
    }
}
