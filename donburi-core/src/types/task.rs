use std::num::NonZeroU32;

use crate::types::{ActionEntries, AnyValue};

/// Keys interpreted by the engine itself; they are never dispatched as actions.
pub const CONTROL_KEYS: [&str; 9] = [
    "name",
    "when",
    "else",
    "retry",
    "rescue",
    "always",
    "register",
    "with_items",
    "with_dict",
];

/// One entry of a task list.
///
/// Control entries are typed fields; every other key of the mapping is kept, in
/// document order, in [`Task::actions`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "else")]
    pub else_tasks: Option<Vec<Task>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<NonZeroU32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescue: Option<Vec<Task>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always: Option<Vec<Task>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_items: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_dict: Option<AnyValue>,

    #[serde(flatten, default)]
    pub actions: ActionEntries,
}

impl Task {
    /// Number of body attempts; `retry` defaults to one.
    pub fn attempts(&self) -> u32 {
        self.retry.map(NonZeroU32::get).unwrap_or(1)
    }

    pub fn is_iterated(&self) -> bool {
        self.with_items.is_some() || self.with_dict.is_some()
    }

    /// Label used in logs and events: the explicit name, else the first action key.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.actions.keys().next().map(String::as_str))
            .unwrap_or("<empty>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_control_and_action_entries() {
        let task: Task = serde_json::from_value(json!({
            "debug": "{{x}}",
            "when": "x != null",
            "eval": "1 + 1",
            "register": "r",
            "retry": 3
        }))
        .unwrap();
        assert_eq!(task.attempts(), 3);
        assert_eq!(task.register.as_deref(), Some("r"));
        let keys: Vec<&str> = task.actions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["debug", "eval"]);
        assert_eq!(task.label(), "debug");
    }

    #[test]
    fn control_keys_never_become_actions() {
        let mut raw = serde_json::Map::new();
        for key in CONTROL_KEYS {
            let value = match key {
                "retry" => json!(2),
                "else" | "rescue" | "always" => json!([]),
                "with_items" => json!([1]),
                "with_dict" => json!({}),
                _ => json!("x"),
            };
            raw.insert(key.to_string(), value);
        }
        raw.insert("debug".into(), json!("hi"));
        let task: Task = serde_json::from_value(serde_json::Value::Object(raw)).unwrap();
        assert_eq!(task.actions.len(), 1);
    }

    #[test]
    fn retry_must_be_positive() {
        let res = serde_json::from_value::<Task>(json!({"debug": "x", "retry": 0}));
        assert!(res.is_err());
    }

    #[test]
    fn nested_lists_are_tasks() {
        let task: Task = serde_json::from_value(json!({
            "fail": "boom",
            "rescue": [{"vars": {"rescued": true}}],
            "else": [{"debug": "skipped"}]
        }))
        .unwrap();
        assert_eq!(task.rescue.as_ref().map(Vec::len), Some(1));
        assert_eq!(task.else_tasks.as_ref().map(Vec::len), Some(1));
        assert_eq!(task.attempts(), 1);
    }
}
