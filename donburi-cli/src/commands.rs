use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate a task document.
    Validate {
        path: PathBuf,
        /// Reject action names the `run` command would not know.
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Summarize the task lists of a document.
    Inspect {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the actions a run can dispatch to.
    Actions {
        #[command(flatten)]
        host: HostArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Deliver one event to a document and print the resulting context.
    Run {
        path: PathBuf,
        /// Event kind, e.g. `post_create` or `pre_delete_in_transaction`.
        #[arg(long)]
        event: String,
        /// JSON/YAML mapping used as the initial context.
        #[arg(long)]
        context: Option<PathBuf>,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set_vars: Vec<String>,
        #[arg(long, value_enum, default_value_t = EventsMode::None)]
        events: EventsMode,
        /// Print run metrics after the context.
        #[arg(long)]
        metrics: bool,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        host: HostArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
