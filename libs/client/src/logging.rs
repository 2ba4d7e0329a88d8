//! Diagnostic logging setup.
//!
//! Widgets are free to install their own subscriber instead; every log
//! line this crate emits goes through `tracing` and carries the channel's
//! environment prefix where one exists.

/// Initialize the diagnostic subscriber at the given level. Safe to call
/// more than once; later calls are no-ops.
pub fn init(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .try_init();
}
