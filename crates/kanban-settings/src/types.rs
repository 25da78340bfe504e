use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KanbanSettings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cors: CorsSettings,
    pub logging: LoggingSettings,
    pub board: BoardSettings,
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port. `0` picks a free port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// SQLite file. Relative paths resolve against the working directory.
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: kanban_home().join("board.db"),
        }
    }
}

/// Cross-origin access for the browser UI.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsSettings {
    /// Exact origins allowed to call the API.
    pub allowed_origins: Vec<String>,
    /// Allow cookies and CSRF tokens on cross-origin requests.
    pub allow_credentials: bool,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            // Vite dev server
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// JSON lines on stdout; human-readable output otherwise.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSettings {
    /// Renumber non-dense columns when the server starts.
    pub repair_positions_on_start: bool,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            repair_positions_on_start: true,
        }
    }
}

/// `~/.kanban`, falling back to `/tmp/.kanban` without a home directory.
pub fn kanban_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".kanban")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_vite_origin() {
        let settings = KanbanSettings::default();
        assert_eq!(settings.cors.allowed_origins, vec!["http://localhost:5173"]);
        assert!(settings.cors.allow_credentials);
        assert_eq!(settings.server.port, 3000);
        assert!(settings.board.repair_positions_on_start);
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(KanbanSettings::default()).unwrap();
        assert!(value["cors"]["allowedOrigins"].is_array());
        assert!(value["board"]["repairPositionsOnStart"].is_boolean());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let settings: KanbanSettings =
            serde_json::from_str(r#"{"server": {"port": 8080}}"#).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.logging.level, "info");
    }
}
