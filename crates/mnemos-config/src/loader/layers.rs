//! Reading, locating and merging config layers.

use super::{ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, schema};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A layer read from disk and checked against the schema.
pub(super) struct LoadedLayer {
    pub meta: ConfigLayer,
    pub value: Value,
}

/// Read a layer. Missing optional layers yield `None`; a missing required
/// layer is a read error.
pub(super) fn read_layer(
    source: ConfigLayerSource,
    path: &Path,
    required: bool,
) -> Result<Option<LoadedLayer>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound && !required => {
            debug!(
                "config layer absent (source={:?}, path={})",
                source,
                path.display()
            );
            return Ok(None);
        }
        Err(err) => {
            return Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };
    let origin = origin_label(source, path);
    let value = parse_json5(&contents, &origin)?;
    schema::validate_layer_schema(&value, &origin)?;
    debug!(
        "config layer read (source={:?}, path={}, bytes={})",
        source,
        path.display(),
        contents.len()
    );
    Ok(Some(LoadedLayer {
        meta: ConfigLayer {
            source,
            path: path.to_path_buf(),
        },
        value,
    }))
}

pub(super) fn parse_json5(contents: &str, origin: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::ParseFailed {
        origin: origin.to_string(),
        source,
    })
}

/// Label used in error paths, e.g. `user(/home/a/.mnemos/mnemos.json5)`.
fn origin_label(source: ConfigLayerSource, path: &Path) -> String {
    let name = match source {
        ConfigLayerSource::User => "user",
        ConfigLayerSource::Project => "project",
        ConfigLayerSource::Cwd => "cwd",
        ConfigLayerSource::Runtime => "runtime",
    };
    format!("{name}({})", path.display())
}

/// `~/.mnemos/mnemos.json5`, when a home directory exists.
pub(super) fn user_config_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
    )
}

/// Nearest ancestor of `start` (inclusive) holding one of `markers`.
pub(super) fn project_root(start: &Path, markers: &[String]) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}

/// Canonical form of `path` if it exists, else `path` itself.
pub(super) fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Fold `top` into `base`. Objects merge key by key; anything else in `top`
/// replaces the value in `base`.
pub(super) fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base), Value::Object(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
