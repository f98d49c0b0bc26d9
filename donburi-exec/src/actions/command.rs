use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::error::TaskError;
use crate::registry::{Action, ActionCall};

#[derive(Debug, Deserialize)]
struct CommandParams {
    name: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Runs an external process and reports `{status, output}`.
///
/// A process that cannot be spawned or exits non-zero is reported as
/// `status: "error"`, not as a task failure.
pub struct CommandAction;

#[async_trait]
impl Action for CommandAction {
    async fn execute(&self, call: ActionCall<'_>) -> Result<Value, TaskError> {
        let params: CommandParams = call.params()?;
        tracing::debug!(command = %params.name, args = ?params.args, "running command");

        let output = Command::new(&params.name).args(&params.args).output().await;
        let (status, text) = match output {
            Ok(out) if out.status.success() => {
                ("success", String::from_utf8_lossy(&out.stdout).into_owned())
            }
            Ok(out) => {
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&out.stderr));
                if text.is_empty() {
                    text = out.status.to_string();
                }
                ("error", text)
            }
            Err(e) => ("error", e.to_string()),
        };
        Ok(json!({ "status": status, "output": text }))
    }
}
