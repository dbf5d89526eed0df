//! Semantic configuration checks.
//!
//! Serde handles shape; this module checks the values make sense before
//! any subsystem starts. All problems are collected so operators see the
//! complete list in one failure.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::{AppConfig, SinkKind};

/// One failed semantic check.
#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the merged configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".to_string(),
            message: format!("'{}' is not a valid socket address", config.listener.bind_address),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "listener.request_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.logging.flush_timeout_ms == 0 {
        errors.push(ValidationError {
            field: "logging.flush_timeout_ms".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let mut names = HashSet::new();
    for (i, sink) in config.logging.sinks.iter().enumerate() {
        let field = format!("logging.sinks[{}]", i);
        if sink.name.is_empty() {
            errors.push(ValidationError {
                field: field.clone(),
                message: "sink name must not be empty".to_string(),
            });
        } else if !names.insert(sink.name.clone()) {
            errors.push(ValidationError {
                field: field.clone(),
                message: format!("duplicate sink name '{}'", sink.name),
            });
        }
        if sink.kind == SinkKind::File {
            if sink.directory.is_none() {
                errors.push(ValidationError {
                    field: field.clone(),
                    message: "file sink requires a directory".to_string(),
                });
            }
            if sink.prefix.is_empty() {
                errors.push(ValidationError {
                    field: field.clone(),
                    message: "file sink prefix must not be empty".to_string(),
                });
            }
            if sink.extension.is_empty() || sink.extension.contains('.') {
                errors.push(ValidationError {
                    field,
                    message: "file sink extension must be non-empty and contain no dots"
                        .to_string(),
                });
            }
        }
    }

    for (i, rule) in config.logging.category_rules.iter().enumerate() {
        if rule.prefix.trim_matches(['.', '*']).is_empty() {
            errors.push(ValidationError {
                field: format!("logging.category_rules[{}]", i),
                message: "rule prefix must not be empty".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SinkConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn rejects_bad_bind_address() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
    }

    #[test]
    fn rejects_file_sink_without_directory() {
        let mut config = AppConfig::default();
        config.logging.sinks.push(SinkConfig {
            name: "file".to_string(),
            kind: SinkKind::File,
            ..SinkConfig::default()
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("directory")));
    }

    #[test]
    fn rejects_duplicate_sink_names() {
        let mut config = AppConfig::default();
        config.logging.sinks.push(SinkConfig::default());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }
}
