//! Config discovery and layering.
//!
//! A process config is assembled from up to four kinds of JSON5 file: the
//! user file, the project file found through a root marker, the file in the
//! working directory, and any runtime files named by the caller. Each file is
//! schema-checked on its own, the files are deep-merged, and the merged
//! document is decoded and range-checked once.

mod layers;
mod schema;

#[cfg(test)]
mod tests;

use crate::{ConfigError, MnemosConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "mnemos.json5";
/// Directory under the home directory holding the user file.
const DEFAULT_CONFIG_DIR: &str = ".mnemos";
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Decoded config together with the files it was built from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: MnemosConfig,
    /// Contributing files, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a layer was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    User,
    Project,
    Cwd,
    /// Named explicitly by the caller; must exist.
    Runtime,
}

/// A file that contributed to the effective config.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Inputs to layer discovery.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory the cwd layer and the project root search start from.
    pub cwd: PathBuf,
    /// User file; `None` skips the user layer.
    pub user_config_path: Option<PathBuf>,
    /// Runtime files, applied after every discovered layer.
    pub runtime_paths: Vec<PathBuf>,
    /// Entries whose presence marks a directory as the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Default discovery rooted at `cwd`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layers::user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    pub fn with_user_path(mut self, path: Option<PathBuf>) -> Self {
        self.user_config_path = path;
        self
    }

    /// Append a runtime file.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl MnemosConfig {
    /// Load a single config file without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from path: {}", path.display());
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        let value = layers::parse_json5(&contents, &origin)?;
        decode(value, &origin)
    }

    /// Load a single config from JSON5 text without layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        decode(layers::parse_json5(contents, "config")?, "config")
    }

    /// Load the layer stack discovered from `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the layer stack described by `options`.
    ///
    /// Precedence, lowest first: user, project, cwd, then runtime layers in
    /// the order they were added. A file reached through two discovery
    /// routes is read once, under the first route.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layers::canonical_or_self(&options.cwd);
        let mut discovered: Vec<(ConfigLayerSource, PathBuf)> = Vec::with_capacity(3);
        if let Some(path) = options.user_config_path {
            discovered.push((ConfigLayerSource::User, path));
        }
        if let Some(root) = layers::project_root(&cwd, &options.project_root_markers) {
            discovered.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
        }
        discovered.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));

        let mut seen = HashSet::new();
        let mut loaded = Vec::new();
        for (source, path) in discovered {
            if !seen.insert(layers::canonical_or_self(&path)) {
                debug!("config layer already read (source={:?}, path={})", source, path.display());
                continue;
            }
            loaded.extend(layers::read_layer(source, &path, false)?);
        }
        for path in &options.runtime_paths {
            loaded.extend(layers::read_layer(ConfigLayerSource::Runtime, path, true)?);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        let mut metas = Vec::with_capacity(loaded.len());
        for layer in loaded {
            layers::overlay(&mut merged, layer.value);
            metas.push(layer.meta);
        }
        let config = decode(merged, "effective")?;
        info!("layered config loaded (layers={})", metas.len());
        Ok(LayeredConfig {
            config,
            layers: metas,
        })
    }
}

/// Schema-check, decode and range-check a complete document.
fn decode(value: Value, origin: &str) -> Result<MnemosConfig, ConfigError> {
    schema::validate_layer_schema(&value, origin)?;
    let config: MnemosConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
