pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use shared::{AppConfig, AppError, Result};
pub use state::LedgerEngine;

/// Installs the global `tracing` subscriber. Later calls are no-ops.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_ledger=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
