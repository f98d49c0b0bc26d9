use tracing_subscriber::EnvFilter;

use crate::args::LogArgs;

/// Install the global subscriber. `RUST_LOG` overrides `--log-level`; logs go
/// to stderr so stdout stays machine-readable.
pub fn init(args: &LogArgs) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| EnvFilter::try_new(&args.log_level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
