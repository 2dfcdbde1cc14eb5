//! Configuration models and layered config loading.
//!
//! This crate owns the Mnemos config schema, validation, and layer-merging
//! logic. Configuration is loaded once by the entry point and handed to
//! component constructors; nothing below the entry point reads the
//! environment.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
