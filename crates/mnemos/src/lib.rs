//! Public SDK surface for Mnemos.
//!
//! Re-exports the building blocks and wires a ready-to-run [`Engine`] from a
//! loaded [`MnemosConfig`].

mod bootstrap;

pub use bootstrap::{
    BootstrapError, Credentials, build_embedder, build_engine, build_memory, build_services,
};

/// Re-export for convenience.
pub use mnemos_config as config;
pub use mnemos_core as core;
/// Re-export for convenience.
pub use mnemos_memory as memory;
/// Re-export for convenience.
pub use mnemos_protocol as protocol;
pub use mnemos_tools as tools;

pub use mnemos_config::MnemosConfig;
pub use mnemos_core::{CancellationToken, Engine, TurnRequest, TurnResult};

/// Initialize `env_logger` from `RUST_LOG`; repeated calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
