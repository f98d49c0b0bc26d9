use std::time::Duration;

/// Limits and logging knobs for one [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Deepest allowed nesting of task lists (else/rescue/always/block/resources).
    pub max_depth: usize,
    /// Include substituted action values in debug logs.
    pub log_values: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            log_values: false,
        }
    }
}

/// Settings for the reference host actions.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Base URL of the generic REST adapter; `rest` is only registered when set.
    pub rest_base_url: Option<url::Url>,
    pub http_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            rest_base_url: None,
            http_timeout: Duration::from_secs(30),
        }
    }
}
