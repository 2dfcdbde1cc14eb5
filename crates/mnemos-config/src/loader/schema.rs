//! Structural checks for config documents.
//!
//! The accepted shape is described by static tables so that every layer can
//! be checked before merging, with errors naming the file and the dotted
//! field path.

use crate::ConfigError;
use serde_json::Value;

/// Expected JSON shape of a field.
enum Kind {
    Str,
    UInt,
    Num,
    Strings,
    OneOf(&'static [&'static str]),
    Object(&'static [(&'static str, Kind)]),
}

const ROOT: &[(&str, Kind)] = &[
    ("$schema", Kind::Str),
    ("model", Kind::Object(MODEL)),
    ("memory", Kind::Object(MEMORY)),
    ("tools", Kind::Object(TOOLS)),
    ("engine", Kind::Object(ENGINE)),
];

const MODEL: &[(&str, Kind)] = &[
    ("provider", Kind::Str),
    ("name", Kind::Str),
    ("base_url", Kind::Str),
    ("temperature", Kind::Num),
    ("max_tokens", Kind::UInt),
];

const MEMORY: &[(&str, Kind)] = &[
    ("store", Kind::OneOf(&["memory", "jsonl"])),
    ("path", Kind::Str),
    ("embedder", Kind::Object(EMBEDDER)),
    ("recall_k", Kind::UInt),
    ("recall_query_token_budget", Kind::UInt),
    ("min_score", Kind::Num),
];

const EMBEDDER: &[(&str, Kind)] = &[
    ("provider", Kind::OneOf(&["hashing", "openai"])),
    ("model", Kind::Str),
    ("base_url", Kind::Str),
    ("dimension", Kind::UInt),
];

const TOOLS: &[(&str, Kind)] = &[
    ("policy", Kind::Object(POLICY)),
    ("web_search", Kind::Object(WEB_SEARCH)),
];

const POLICY: &[(&str, Kind)] = &[("allow", Kind::Strings), ("deny", Kind::Strings)];

const WEB_SEARCH: &[(&str, Kind)] = &[
    ("provider", Kind::Str),
    ("max_results", Kind::UInt),
    ("base_url", Kind::Str),
];

const ENGINE: &[(&str, Kind)] = &[
    ("max_iterations", Kind::UInt),
    ("call_timeout_secs", Kind::UInt),
    ("max_history_messages", Kind::UInt),
    ("system_prompt", Kind::Str),
];

/// Check one document (a single layer or the merged result). Every field
/// is optional; present fields must have the right shape and no unknown
/// keys are allowed.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    check(value, &Kind::Object(ROOT), layer, "")
}

fn check(value: &Value, kind: &Kind, layer: &str, path: &str) -> Result<(), ConfigError> {
    let fail = |message: &str| -> Result<(), ConfigError> {
        Err(invalid_field(layer, path, message))
    };
    match kind {
        Kind::Str if !value.is_string() => fail("expected string"),
        Kind::UInt if !value.is_u64() => fail("expected non-negative integer"),
        Kind::Num if !value.is_number() => fail("expected number"),
        Kind::Strings => {
            let Some(items) = value.as_array() else {
                return fail("expected array");
            };
            match items.iter().position(|item| !item.is_string()) {
                Some(idx) => Err(invalid_field(layer, &format!("{path}[{idx}]"), "expected string")),
                None => Ok(()),
            }
        }
        Kind::OneOf(variants) => match value.as_str() {
            None => fail("expected string"),
            Some(text) if variants.contains(&text) => Ok(()),
            Some(_) => fail(&format!("expected one of: {}", variants.join(", "))),
        },
        Kind::Object(fields) => {
            let Some(map) = value.as_object() else {
                return fail("expected object");
            };
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                let Some((_, child_kind)) = fields.iter().find(|(name, _)| name == key) else {
                    return Err(invalid_field(layer, &child_path, "unknown key"));
                };
                check(child, child_kind, layer, &child_path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
