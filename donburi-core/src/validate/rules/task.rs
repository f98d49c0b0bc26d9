use serde_json::Value;

use crate::types::Task;
use crate::validate::rules::common::{validate_expression, validate_statement, validate_value_exprs};
use crate::validate::validator::{Validator, VAR_NAME_RE};

/// Actions whose value is itself a task list.
const NESTED_LIST_ACTIONS: [&str; 2] = ["block", "resources"];

pub(crate) fn validate_task_list(v: &mut Validator, tasks: &[Task], path: &str) {
    for (idx, task) in tasks.iter().enumerate() {
        validate_task(v, task, &format!("{path}[{idx}]"));
    }
}

pub(crate) fn validate_task(v: &mut Validator, task: &Task, path: &str) {
    let has_nested = task.else_tasks.is_some() || task.rescue.is_some() || task.always.is_some();
    if task.actions.is_empty() && !has_nested {
        v.push(path, "task has no action entries");
    }

    if let Some(when) = &task.when {
        let when_path = format!("{path}.when");
        match when {
            Value::Bool(_) => {}
            Value::String(expr) => validate_expression(v, &when_path, expr),
            _ => v.push(when_path, "must be a boolean or an expression string"),
        }
    }

    if let Some(items) = &task.with_items {
        let items_path = format!("{path}.with_items");
        match items {
            Value::Array(_) => validate_value_exprs(v, &items_path, items),
            Value::String(expr) => validate_expression(v, &items_path, expr),
            _ => v.push(items_path, "must be a list or an expression string"),
        }
    }

    if let Some(dict) = &task.with_dict {
        let dict_path = format!("{path}.with_dict");
        match dict {
            Value::Object(_) => validate_value_exprs(v, &dict_path, dict),
            Value::String(expr) => validate_expression(v, &dict_path, expr),
            _ => v.push(dict_path, "must be a mapping or an expression string"),
        }
    }

    if v.options.strict && task.with_items.is_some() && task.with_dict.is_some() {
        v.push(
            path,
            "with_items and with_dict are both set; both loops run and the last one wins the result",
        );
    }
    if task.is_iterated() && task.actions.is_empty() {
        v.push(path, "iteration has no action entry to invoke");
    }

    if let Some(register) = &task.register {
        if register.is_empty() {
            v.push(format!("{path}.register"), "must not be empty");
        } else if v.options.strict && !VAR_NAME_RE.is_match(register) {
            v.push(
                format!("{path}.register"),
                "is not an expression-addressable name ([A-Za-z_$][A-Za-z0-9_$]*)",
            );
        }
    }

    for (name, value) in &task.actions {
        validate_action(v, name, value, &format!("{path}.{name}"));
    }

    if let Some(tasks) = &task.else_tasks {
        validate_task_list(v, tasks, &format!("{path}.else"));
    }
    if let Some(tasks) = &task.rescue {
        validate_task_list(v, tasks, &format!("{path}.rescue"));
    }
    if let Some(tasks) = &task.always {
        validate_task_list(v, tasks, &format!("{path}.always"));
    }
}

fn validate_action(v: &mut Validator, name: &str, value: &Value, path: &str) {
    if name.trim().is_empty() {
        v.push(path, "action name must not be empty");
        return;
    }
    if !v.is_known_action(name) {
        v.push(path, format!("unknown action '{name}'"));
    }

    if NESTED_LIST_ACTIONS.contains(&name) {
        match serde_json::from_value::<Vec<Task>>(value.clone()) {
            Ok(tasks) => validate_task_list(v, &tasks, path),
            Err(e) => v.push(path, format!("must be a task list: {e}")),
        }
        return;
    }

    match name {
        "eval" => match value {
            Value::String(stmt) => validate_statement(v, path, stmt),
            _ => v.push(path, "must be an expression string"),
        },
        "vars" => {
            if !value.is_object() {
                v.push(path, "must be a mapping");
            }
        }
        _ => validate_value_exprs(v, path, value),
    }
}
