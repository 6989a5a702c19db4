//! tabweave: keeps a backend's tab list and a host's embedded web surfaces in step.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod command;
pub mod coordinator;
pub mod gateway;
pub mod host;
pub mod managers;
pub mod platform;
pub mod runtime;
pub mod services;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over the `info` default.
/// Safe to call more than once.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
