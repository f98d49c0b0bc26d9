#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
    #[error("expression is longer than {0} tokens")]
    TooLong(usize),
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("{function}() expects {expected}")]
    BadArguments {
        function: String,
        expected: &'static str,
    },
    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("cannot apply '{op}' to {operand}")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },
    #[error("cannot index {target} with {index}")]
    BadIndex { target: &'static str, index: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic result is not a finite number")]
    NonFinite,
    #[error("assignment is only allowed in eval statements")]
    AssignmentNotAllowed,
    #[error("left side of assignment must be a variable path")]
    InvalidAssignmentTarget,
}
