use crate::types::Task;

pub type TaskList = Vec<Task>;

/// A task document: one list for the general phase of an event and one for
/// its `_in_transaction` variant.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: TaskList,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db_tasks: TaskList,
}

