//! Static overview of a task document, used by `donburi inspect`.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::types::{Document, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentSummary {
    pub tasks: ListSummary,
    pub db_tasks: ListSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListSummary {
    /// Top-level entries of the list.
    pub top_level: usize,
    /// Every task, including those nested in else/rescue/always/block/resources.
    pub total: usize,
    pub max_depth: usize,
    /// Action name -> number of tasks using it.
    pub actions: BTreeMap<String, usize>,
    pub registers: BTreeSet<String>,
    pub guarded: usize,
    pub iterated: usize,
    pub retried: usize,
}

impl DocumentSummary {
    pub fn of(doc: &Document) -> Self {
        Self {
            tasks: ListSummary::of(&doc.tasks),
            db_tasks: ListSummary::of(&doc.db_tasks),
        }
    }

    pub fn action_names(&self) -> BTreeSet<&str> {
        self.tasks
            .actions
            .keys()
            .chain(self.db_tasks.actions.keys())
            .map(String::as_str)
            .collect()
    }
}

impl ListSummary {
    pub fn of(tasks: &[Task]) -> Self {
        let mut summary = ListSummary {
            top_level: tasks.len(),
            ..ListSummary::default()
        };
        summary.visit_list(tasks, 1);
        summary
    }

    fn visit_list(&mut self, tasks: &[Task], depth: usize) {
        for task in tasks {
            self.visit(task, depth);
        }
    }

    fn visit(&mut self, task: &Task, depth: usize) {
        self.total += 1;
        self.max_depth = self.max_depth.max(depth);
        if task.when.is_some() {
            self.guarded += 1;
        }
        if task.is_iterated() {
            self.iterated += 1;
        }
        if task.attempts() > 1 {
            self.retried += 1;
        }
        if let Some(r) = &task.register {
            self.registers.insert(r.clone());
        }

        for (name, value) in &task.actions {
            *self.actions.entry(name.clone()).or_default() += 1;
            if matches!(name.as_str(), "block" | "resources") {
                if let Ok(nested) = serde_json::from_value::<Vec<Task>>(value.clone()) {
                    self.visit_list(&nested, depth + 1);
                }
            }
        }

        for nested in [&task.else_tasks, &task.rescue, &task.always].into_iter().flatten() {
            self.visit_list(nested, depth + 1);
        }
    }
}

/// Count the `{{ }}` placeholders in a value tree.
pub fn count_placeholders(value: &Value) -> usize {
    match value {
        Value::String(s) => s.matches("{{").count(),
        Value::Array(items) => items.iter().map(count_placeholders).sum(),
        Value::Object(map) => map.values().map(count_placeholders).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_nested_tasks() {
        let doc: Document = serde_json::from_value(json!({
            "tasks": [
                {"vars": {"a": 1}, "register": "r"},
                {"block": [
                    {"debug": "{{a}}", "when": "a == 1"},
                    {"fail": "x", "rescue": [{"debug": "rescued"}]}
                ]}
            ]
        }))
        .unwrap();
        let s = DocumentSummary::of(&doc);
        assert_eq!(s.tasks.top_level, 2);
        assert_eq!(s.tasks.total, 5);
        assert_eq!(s.tasks.max_depth, 3);
        assert_eq!(s.tasks.actions.get("debug"), Some(&2));
        assert_eq!(s.tasks.guarded, 1);
        assert!(s.tasks.registers.contains("r"));
        assert_eq!(s.db_tasks, ListSummary::default());
    }

    #[test]
    fn placeholder_count() {
        assert_eq!(count_placeholders(&json!({"a": ["{{x}}{{y}}", 1], "b": "{{z}}"})), 3);
    }
}
