use std::env;
use std::fs;
use std::path::Path;

use serde::Serialize;
use starbags_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{to_data, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key: &str, env_keys: &[&str]| {
        field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let entries = vec![
        ConfigEntry {
            key: "storage.url",
            value: config.storage.url.clone(),
            source: source("storage.url", &["STARBAGS_STORAGE_URL"]),
        },
        ConfigEntry {
            key: "storage.max_connections",
            value: config.storage.max_connections.to_string(),
            source: source("storage.max_connections", &["STARBAGS_STORAGE_MAX_CONNECTIONS"]),
        },
        ConfigEntry {
            key: "storage.timeout_secs",
            value: config.storage.timeout_secs.to_string(),
            source: source("storage.timeout_secs", &["STARBAGS_STORAGE_TIMEOUT_SECS"]),
        },
        ConfigEntry {
            key: "inventory.base_url",
            value: config.inventory.base_url.clone(),
            source: source("inventory.base_url", &["STARBAGS_INVENTORY_BASE_URL"]),
        },
        ConfigEntry {
            key: "inventory.timeout_secs",
            value: config.inventory.timeout_secs.to_string(),
            source: source("inventory.timeout_secs", &["STARBAGS_INVENTORY_TIMEOUT_SECS"]),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: source("logging.level", &["STARBAGS_LOGGING_LEVEL", "STARBAGS_LOG_LEVEL"]),
        },
        ConfigEntry {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_lowercase(),
            source: source("logging.format", &["STARBAGS_LOGGING_FORMAT", "STARBAGS_LOG_FORMAT"]),
        },
    ];

    match to_data(&entries) {
        Ok(data) => CommandResult::success_with_data(
            "config",
            "effective config (source precedence: env > file > default)",
            data,
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("config", error_class, message, exit_code)
        }
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, field_source};

    #[test]
    fn file_keys_are_attributed_to_the_file() {
        let doc: Value = "[storage]\nurl = \"sqlite://file.db\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "storage.url"));
        assert!(!contains_path(&doc, "storage.timeout_secs"));
        assert_eq!(
            field_source("storage.url", &["STARBAGS_TEST_UNSET_KEY"], Some(&doc), None),
            "file (config file)"
        );
        assert_eq!(field_source("logging.level", &[], Some(&doc), None), "default");
    }
}
