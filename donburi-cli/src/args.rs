use clap::{Args, ValueEnum};

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Log filter, e.g. `info` or `donburi_exec=debug`. `RUST_LOG` takes precedence.
    #[arg(long, env = "DONBURI_LOG", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    #[arg(long, default_value_t = 64)]
    pub max_depth: usize,
    /// Include substituted action values in debug logs.
    #[arg(long)]
    pub log_values: bool,
}

#[derive(Debug, Args, Clone)]
pub struct HostArgs {
    /// Base URL for the `rest` action; `rest` is unavailable without it.
    #[arg(long, env = "DONBURI_REST_URL")]
    pub rest_url: Option<String>,
    /// Register the `http` action backed by a real HTTP client.
    #[arg(long)]
    pub http: bool,
    #[arg(long, default_value_t = 30_000)]
    pub http_timeout_ms: u64,
    /// JSON/YAML file of `schema -> [resource]` used to seed the in-memory store.
    #[arg(long)]
    pub store_seed: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventsMode {
    None,
    Stdout,
}
