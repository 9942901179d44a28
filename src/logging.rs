//! Logging setup.
//!
//! Mirrors the original application's logging configuration: `INFO` by
//! default, `DEBUG` with `--verbose`, and noisy HTTP client crates quieted
//! down a level so they don't drown out this application's own events.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{default_level},reqwest=warn,hyper=warn,hyper_util=warn").into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
