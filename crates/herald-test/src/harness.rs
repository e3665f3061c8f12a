//! Test harness helpers.

use std::io::Write;
use std::time::Duration;

use herald_events::AsyncEmitter;
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

/// How long helpers wait for an asynchronous emitter to go idle.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Set up test logging with the given filter.
///
/// Safe to call from every test; only the first call installs a subscriber.
///
/// # Example
///
/// ```rust
/// use herald_test::setup_test_logging;
///
/// #[test]
/// fn my_test() {
///     setup_test_logging("herald_events=trace");
///     // ... test code
/// }
/// ```
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// Block until `emitter` has delivered everything queued.
///
/// # Panics
///
/// Panics if the emitter is still draining after [`IDLE_TIMEOUT`].
pub fn assert_idle(emitter: &AsyncEmitter) {
    assert!(
        emitter.wait_idle(IDLE_TIMEOUT),
        "emitter still draining after {IDLE_TIMEOUT:?} ({} pending)",
        emitter.pending()
    );
}

/// Create a temporary `.toml` file with the given content.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_config_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}
