use mockproc_common::env_vars::LOG_VAR;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a stderr subscriber filtered by `MOCKPROC_LOG`.
///
/// Silent unless the variable is set, so a shimmed command's stderr carries
/// only what its route produced.
pub fn init() {
    let env_filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("off"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in a test harness
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
