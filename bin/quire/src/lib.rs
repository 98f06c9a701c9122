//! Quire CLI Library
//!
//! Command implementations behind the `quire` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, clean, serve, cv)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use quire::cmd::build::{BuildArgs, run};
//!
//! // Build the site described by quire.toml
//! run(Path::new("quire.toml"), &BuildArgs::default()).unwrap();
//! ```

pub mod cmd;

pub use quire_core::Config;
pub use quire_generator::{BuildSummary, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// # Example
///
/// ```no_run
/// quire::init_tracing(2); // Enable DEBUG level logging
/// ```
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
