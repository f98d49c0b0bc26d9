use donburi_core::expressions::{ExprError, TemplateError};

use crate::http::HttpError;

/// Every failure a task can raise. Control flow treats all variants alike;
/// the variant only shapes the message recorded into the error slot.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("guard evaluation failed: {0}")]
    Guard(#[source] ExprError),
    #[error("invalid iteration source for {kind}: {message}")]
    IterationSource { kind: &'static str, message: String },
    #[error("{0}")]
    Raised(String),
    #[error("{action} failed: {message}")]
    Action { action: String, message: String },
    #[error(transparent)]
    Template(#[from] RenderError),
    #[error("expression failed: {0}")]
    Expression(#[from] ExprError),
    #[error("no such action: {0}")]
    NoSuchAction(String),
    #[error("invalid parameters for {action}: {message}")]
    InvalidParams { action: String, message: String },
    #[error("task nesting exceeds the maximum depth of {0}")]
    DepthExceeded(usize),
    #[error("http request failed: {0}")]
    Http(#[from] HttpError),
}

impl TaskError {
    pub fn action(action: &str, message: impl Into<String>) -> Self {
        TaskError::Action {
            action: action.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_params(action: &str, message: impl Into<String>) -> Self {
        TaskError::InvalidParams {
            action: action.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("{0}")]
    Other(String),
}

impl From<TemplateError> for TaskError {
    fn from(e: TemplateError) -> Self {
        TaskError::Template(RenderError::Template(e))
    }
}
