//! Ready-made `tracing` subscribers.
//!
//! ```no_run
//! reckon::logging::init();
//! tracing::info!("evaluating");
//! ```

use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

/// Compact logging at `INFO`, overridable through `RUST_LOG`.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Compact logging at `level`, overridable through `RUST_LOG`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .compact()
        .with_filter(filter);

    Registry::default().with(layer).try_init().ok();
}
