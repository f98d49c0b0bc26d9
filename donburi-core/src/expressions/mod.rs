mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod template;

pub use ast::{AssignOp, BinaryOp, Expr, Statement, UnaryOp};
pub use error::ExprError;
pub use eval::{display, eval_expr, exec_statement, is_loosely_false, is_truthy, json_eq, type_name, CONTEXT_ROOT};
pub use lexer::{tokenize, Spanned, Token};
pub use parser::{parse_expression, parse_statement};
pub use template::{parse_template, render_template, Segment, Template, TemplateError};

use crate::context::Context;
use crate::types::AnyValue;

/// Parse and evaluate a side-effect free expression.
pub fn evaluate(input: &str, ctx: &Context) -> Result<AnyValue, ExprError> {
    eval_expr(&parse_expression(input)?, ctx)
}

/// Parse and run an expression or assignment statement.
pub fn execute(input: &str, ctx: &mut Context) -> Result<AnyValue, ExprError> {
    exec_statement(&parse_statement(input)?, ctx)
}

/// Check that every templated string inside a value parses.
pub fn validate_value_templates(value: &AnyValue) -> Result<(), TemplateError> {
    match value {
        AnyValue::String(s) if s.contains("{{") => parse_template(s).map(|_| ()),
        AnyValue::Array(items) => items.iter().try_for_each(validate_value_templates),
        AnyValue::Object(map) => map.values().try_for_each(validate_value_templates),
        _ => Ok(()),
    }
}
