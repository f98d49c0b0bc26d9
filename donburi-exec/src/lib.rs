#![forbid(unsafe_code)]

//! Task engine for donburi documents.
//!
//! The document model, expression language and validator live in `donburi-core`.

pub mod actions;
pub mod bindings;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod substitute;

pub use crate::bindings::{EventBindings, EventDispatcher, EventHandler, EventHost, TaskListHandler};
pub use crate::config::{EngineConfig, HostConfig};
pub use crate::engine::{Engine, RunScope};
pub use crate::error::{RenderError, TaskError};
pub use crate::events::{CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink};
pub use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use crate::metrics::{MetricsCollector, MetricsEventSink, RunMetrics};
pub use crate::registry::{Action, ActionCall, ActionRegistry};
pub use crate::substitute::{substitute, ExpressionRenderer, TemplateRenderer};
