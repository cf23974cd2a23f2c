//! Tracing setup for the command-line front end.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "DOCGRAPH_LOG";

/// Filter string for a `DOCGRAPH_LOG` value.
///
/// Accepts the numeric shorthands `0`..`4`, level names, or any custom
/// directive such as `docgraph::parser=debug`.
pub fn filter_directive(value: Option<&str>, verbose: bool) -> String {
    let default = if verbose { "info" } else { "warn" };
    match value.map(str::trim) {
        None | Some("") => default.to_string(),
        Some("0" | "off" | "none") => "error".to_string(),
        Some("1" | "warn") => "warn".to_string(),
        Some("2" | "info") => "info".to_string(),
        Some("3" | "debug") => "debug".to_string(),
        Some("4" | "trace") => "trace".to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// Install a stderr fmt subscriber. Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let value = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(value.as_deref(), verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
