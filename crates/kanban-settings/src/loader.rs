//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{kanban_home, KanbanSettings};

/// Resolve the path to the settings file (`~/.kanban/settings.json`).
pub fn settings_path() -> PathBuf {
    kanban_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<KanbanSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<KanbanSettings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn load_file(path: &Path) -> Result<KanbanSettings> {
    let defaults = serde_json::to_value(KanbanSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `KANBAN_*` overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides<F>(settings: &mut KanbanSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = read("KANBAN_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("KANBAN_PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => settings.server.port = port,
            Err(_) => warn_invalid("KANBAN_PORT", &v),
        }
    }
    if let Some(v) = read("KANBAN_DB") {
        settings.database.path = PathBuf::from(v);
    }
    if let Some(v) = read("KANBAN_CORS_ORIGINS") {
        settings.cors.allowed_origins = parse_list(&v);
    }
    if let Some(v) = read("KANBAN_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("KANBAN_LOG_JSON") {
        match parse_bool(&v) {
            Some(json) => settings.logging.json = json,
            None => warn_invalid("KANBAN_LOG_JSON", &v),
        }
    }
    if let Some(v) = read("KANBAN_REPAIR_POSITIONS") {
        match parse_bool(&v) {
            Some(repair) => settings.board.repair_positions_on_start = repair,
            None => warn_invalid("KANBAN_REPAIR_POSITIONS", &v),
        }
    }
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma separated list, dropping empty entries.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn warn_invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "invalid env var, ignoring");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 3000, "host": "127.0.0.1"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "127.0.0.1");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"origins": ["a", "b"]});
        let source = serde_json::json!({"origins": ["c"]});
        assert_eq!(deep_merge(target, source)["origins"], serde_json::json!(["c"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null});
        assert_eq!(deep_merge(target, source)["a"], 1);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.server.port, KanbanSettings::default().server.port);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 8088}, "cors": {"allowedOrigins": ["https://board.example"]}}"#,
        )
        .unwrap();

        let settings = load_file(&path).unwrap();
        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.cors.allowed_origins, vec!["https://board.example"]);
        assert!(settings.cors.allow_credentials);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        assert!(matches!(load_file(&path), Err(SettingsError::Json(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let mut settings = KanbanSettings::default();
        apply_env_overrides(
            &mut settings,
            env(&[
                ("KANBAN_HOST", "0.0.0.0"),
                ("KANBAN_PORT", "4000"),
                ("KANBAN_DB", "/var/lib/kanban/board.db"),
                ("KANBAN_CORS_ORIGINS", "http://a.test, http://b.test,"),
                ("KANBAN_LOG_LEVEL", "debug"),
                ("KANBAN_LOG_JSON", "off"),
                ("KANBAN_REPAIR_POSITIONS", "no"),
            ]),
        );
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.database.path, PathBuf::from("/var/lib/kanban/board.db"));
        assert_eq!(settings.cors.allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(settings.logging.level, "debug");
        assert!(!settings.logging.json);
        assert!(!settings.board.repair_positions_on_start);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut settings = KanbanSettings::default();
        apply_env_overrides(
            &mut settings,
            env(&[("KANBAN_PORT", "99999"), ("KANBAN_LOG_JSON", "maybe"), ("KANBAN_HOST", "")]),
        );
        assert_eq!(settings.server.port, 3000);
        assert!(settings.logging.json);
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn parse_bool_variants() {
        for val in ["true", "1", "YES", "On"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in ["false", "0", "no", "OFF"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("2"), None);
    }
}
