use serde_json::Value;

use super::ast::Expr;
use super::error::ExprError;
use super::eval::{display, eval_expr};
use super::parser::parse_expression;
use crate::context::Context;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// True when the template contains no `{{ }}` placeholders.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    pub fn render(&self, ctx: &Context) -> Result<String, TemplateError> {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(l) => out.push_str(l),
                Segment::Expr(e) => {
                    let v: Value = eval_expr(e, ctx).map_err(TemplateError::Render)?;
                    out.push_str(&display(&v));
                }
            }
        }
        Ok(out)
    }
}

/// Split a string into literal text and `{{ expr }}` placeholders.
///
/// A leading `.` inside a placeholder is dropped so `{{.name}}` and `{{ name }}`
/// are equivalent.
pub fn parse_template(input: &str) -> Result<Template, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let (literal, after_open) = rest.split_at(start);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal.to_string()));
        }
        let body = &after_open[2..];
        let end = find_close(body).ok_or(TemplateError::UnclosedExpression)?;
        let inner = body[..end].trim();
        let inner = inner.strip_prefix('.').unwrap_or(inner);
        let expr = parse_expression(inner).map_err(|source| TemplateError::InvalidExpression {
            expr: inner.to_string(),
            source,
        })?;
        segments.push(Segment::Expr(expr));
        rest = &body[end + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Template { segments })
}

/// Byte offset of the first `}}` outside a quoted string literal.
fn find_close(body: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '\'' || c == '"' => quote = Some(c),
            None if body[i..].starts_with("}}") => return Some(i),
            None => {}
        }
    }
    None
}

pub fn render_template(input: &str, ctx: &Context) -> Result<String, TemplateError> {
    if !input.contains("{{") {
        return Ok(input.to_string());
    }
    parse_template(input)?.render(ctx)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template expression '{expr}': {source}")]
    InvalidExpression {
        expr: String,
        #[source]
        source: ExprError,
    },
    #[error("unclosed template expression (missing '}}}}')")]
    UnclosedExpression,
    #[error("template rendering failed: {0}")]
    Render(#[source] ExprError),
}
