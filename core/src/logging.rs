// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Standardized logging initialisers for the Martim engine.
//!
//! Levels come from `RUST_LOG` (default INFO), e.g.:
//!
//! ```bash
//! export RUST_LOG=martim_core=debug,martim_strategies=trace
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inicializa logging padrão não-JSON do `Martim`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// Inicializa logging JSON do `Martim` (agregadores / observabilidade).
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}
