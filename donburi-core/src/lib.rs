#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod expressions;
pub mod parser;
pub mod summary;
pub mod types;
pub mod validate;

pub use crate::context::Context;
pub use crate::error::{DonburiError, ParseError, ValidationError, Violation};
pub use crate::parser::{parse_document_str, DocumentFormat, ParsedDocument};
pub use crate::summary::{DocumentSummary, ListSummary};
pub use crate::types::{AnyValue, Document, EventCategory, EventKind, Task, TaskList};
pub use crate::validate::{validate_document, validate_document_with, Validate, ValidateOptions};
