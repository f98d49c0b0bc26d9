use crate::types::Document;
use crate::validate::rules::task;
use crate::validate::validator::Validator;

pub(crate) fn validate_document(v: &mut Validator, doc: &Document) {
    if doc.tasks.is_empty() && doc.db_tasks.is_empty() {
        v.push("$", "document has neither tasks nor db_tasks");
    }
    task::validate_task_list(v, &doc.tasks, "$.tasks");
    task::validate_task_list(v, &doc.db_tasks, "$.db_tasks");
}
