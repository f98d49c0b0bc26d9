use serde_json::Value;

use crate::expressions::{parse_expression, parse_statement, validate_value_templates};
use crate::validate::validator::Validator;

pub(crate) fn validate_expression(v: &mut Validator, path: &str, expr: &str) {
    if let Err(e) = parse_expression(expr) {
        v.push(path, format!("invalid expression: {e}"));
    }
}

pub(crate) fn validate_statement(v: &mut Validator, path: &str, stmt: &str) {
    if let Err(e) = parse_statement(stmt) {
        v.push(path, format!("invalid eval statement: {e}"));
    }
}

pub(crate) fn validate_value_exprs(v: &mut Validator, path: &str, value: &Value) {
    if let Err(e) = validate_value_templates(value) {
        v.push(path, format!("invalid template inside value: {e}"));
    }
}
