use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::events::{Event, EventSink};

#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub run_id: Option<Uuid>,
    pub event: String,
    pub status: String,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub total_duration: Option<Duration>,
    pub attempts: usize,
    pub attempts_failed: usize,
    pub tasks_skipped: usize,
    pub guard_failures: usize,
    pub rescues: usize,
    pub always_runs: usize,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_run_started(&mut self, run_id: Uuid, event: &str) {
        self.run_id = Some(run_id);
        self.event = event.to_string();
        self.status = "running".to_string();
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn record_attempt_failure(&mut self) {
        self.attempts_failed += 1;
    }

    pub fn record_skip(&mut self) {
        self.tasks_skipped += 1;
    }

    pub fn record_guard_failure(&mut self) {
        self.guard_failures += 1;
    }

    pub fn record_rescue(&mut self) {
        self.rescues += 1;
    }

    pub fn record_always(&mut self) {
        self.always_runs += 1;
    }

    pub fn finish(&mut self, status: &str) {
        self.status = status.to_string();
        self.finished_at = Some(Instant::now());
        if let (Some(started), Some(finished)) = (self.started_at, self.finished_at) {
            self.total_duration = Some(finished.duration_since(started));
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "run_id": self.run_id.map(|id| id.to_string()),
            "event": self.event,
            "status": self.status,
            "duration_ms": self.total_duration.map(|d| d.as_millis() as u64),
            "attempts": {
                "total": self.attempts,
                "failed": self.attempts_failed,
            },
            "tasks": {
                "skipped": self.tasks_skipped,
                "guard_failures": self.guard_failures,
            },
            "rescues": self.rescues,
            "always": self.always_runs,
        })
    }
}

pub struct MetricsCollector {
    metrics: Arc<Mutex<RunMetrics>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(RunMetrics::new())),
        }
    }

    pub async fn record(&self, event: &Event) {
        let mut m = self.metrics.lock().await;
        match event {
            Event::RunStarted { run_id, event, .. } => m.record_run_started(*run_id, event.as_str()),
            Event::RunFinished {
                failure,
                error_recorded,
                ..
            } => {
                let status = if failure.is_some() {
                    "failed"
                } else if *error_recorded {
                    "completed_with_errors"
                } else {
                    "succeeded"
                };
                m.finish(status);
            }
            Event::AttemptStarted { .. } => m.record_attempt(),
            Event::AttemptFailed { .. } => m.record_attempt_failure(),
            Event::TaskSkipped { .. } => m.record_skip(),
            Event::GuardFailed { .. } => m.record_guard_failure(),
            Event::RescueRan { .. } => m.record_rescue(),
            Event::AlwaysRan { .. } => m.record_always(),
            Event::AttemptSucceeded { .. } => {}
        }
    }

    pub async fn get_metrics(&self) -> RunMetrics {
        self.metrics.lock().await.clone()
    }
}

/// Feeds every event into a collector before forwarding it.
pub struct MetricsEventSink {
    collector: Arc<MetricsCollector>,
    base: Arc<dyn EventSink>,
}

impl MetricsEventSink {
    pub fn new(collector: Arc<MetricsCollector>, base: Arc<dyn EventSink>) -> Self {
        Self { collector, base }
    }
}

#[async_trait]
impl EventSink for MetricsEventSink {
    async fn emit(&self, event: Event) {
        self.collector.record(&event).await;
        self.base.emit(event).await;
    }
}
