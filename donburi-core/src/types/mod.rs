mod common;
mod document;
mod event;
mod task;

pub use common::{ActionEntries, AnyValue};
pub use document::{Document, TaskList};
pub use event::{EventCategory, EventKind, UnknownEventKind};
pub use task::{Task, CONTROL_KEYS};
