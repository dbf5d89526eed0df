//! Layered configuration loading.
//!
//! Sources are merged lowest to highest precedence:
//! 1. base TOML file (missing file = all defaults)
//! 2. environment overlay file `<name>.<environment>.toml`, if present
//! 3. process environment variables `WEATHERCAST__SECTION__FIELD=value`
//!
//! Merging happens on `toml::Value` trees (tables merge recursively,
//! scalars replace), then the merged tree deserializes once into
//! `AppConfig` and is validated.

use std::path::{Path, PathBuf};

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix selecting process environment variables as overrides.
pub const ENV_PREFIX: &str = "WEATHERCAST__";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Env { key: String, reason: String },
    Deserialize(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "Parse error in {}: {}", path.display(), e),
            ConfigError::Env { key, reason } => {
                write!(f, "Invalid environment override {}: {}", key, reason)
            }
            ConfigError::Deserialize(e) => write!(f, "Invalid configuration: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, merge, and validate configuration.
///
/// `environment` selects the overlay file; both the base and the overlay
/// are optional, environment variables always apply.
pub fn load_config(base: &Path, environment: Option<&str>) -> Result<AppConfig, ConfigError> {
    let env_vars: Vec<(String, String)> = std::env::vars().collect();
    load_layered(base, environment, &env_vars)
}

fn load_layered(
    base: &Path,
    environment: Option<&str>,
    env_vars: &[(String, String)],
) -> Result<AppConfig, ConfigError> {
    let mut root = read_layer(base)?.unwrap_or(toml::Value::Table(toml::map::Map::new()));

    if let Some(env) = environment {
        let overlay = overlay_path(base, env);
        if let Some(value) = read_layer(&overlay)? {
            merge(&mut root, value);
        }
    }

    for (key, raw) in env_vars {
        if let Some(path) = key.strip_prefix(ENV_PREFIX) {
            apply_override(&mut root, key, path, raw)?;
        }
    }

    let config: AppConfig = root.try_into().map_err(ConfigError::Deserialize)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// `weathercast.toml` + "production" → `weathercast.production.toml`.
fn overlay_path(base: &Path, environment: &str) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("weathercast");
    base.with_file_name(format!("{}.{}.toml", stem, environment))
}

fn read_layer(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let value = content
        .parse::<toml::Value>()
        .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    Ok(Some(value))
}

/// Recursive merge: tables merge key by key, everything else replaces.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Apply one `WEATHERCAST__SECTION__FIELD=value` override. Path segments
/// are lowercased; intermediate tables are created as needed.
fn apply_override(
    root: &mut toml::Value,
    key: &str,
    path: &str,
    raw: &str,
) -> Result<(), ConfigError> {
    let segments: Vec<String> = path
        .split("__")
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_lowercase())
        .collect();
    if segments.is_empty() {
        return Err(ConfigError::Env {
            key: key.to_string(),
            reason: "empty field path".to_string(),
        });
    }

    let mut node = root;
    for segment in &segments[..segments.len() - 1] {
        let table = node.as_table_mut().ok_or_else(|| ConfigError::Env {
            key: key.to_string(),
            reason: format!("'{}' is not a table", segment),
        })?;
        node = table
            .entry(segment.clone())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let last = &segments[segments.len() - 1];
    let table = node.as_table_mut().ok_or_else(|| ConfigError::Env {
        key: key.to_string(),
        reason: format!("'{}' is not a table", last),
    })?;
    table.insert(last.clone(), parse_env_value(raw));
    Ok(())
}

/// Environment values carry no type information; recognize booleans and
/// integers, keep everything else as a string.
fn parse_env_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    toml::Value::String(raw.to_string())
}
