use crate::error::{Result, SqlChatError};
use std::env;
use std::path::Path;

pub const DEFAULT_ENV_FILE: &str = "./.env_vars";
pub const DEFAULT_SCHEMA: &str = "location_management";
pub const DEFAULT_PROVIDER: &str = "google-gemini";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_DATABASE: &str = "postgres";
const USERNAME: &str = "postgres";

/// connection parameters for the postgres database
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

// keep the password out of debug output and logs
impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub llm: LlmConfig,
    /// schemas to introspect; empty means every user schema
    pub schemas: Vec<String>,
    /// schema generated queries run against
    pub target_schema: String,
}

impl AppConfig {
    /// load a `.env_vars` style file into the process environment.
    /// returns `false` when the file does not exist.
    pub fn load_env_file(env_file: &Path) -> Result<bool> {
        match dotenvy::from_path(env_file) {
            Ok(()) => Ok(true),
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(SqlChatError::Config(format!(
                "failed to read {}: {}",
                env_file.display(),
                e
            ))),
        }
    }

    /// read the config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// build the config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let password = get("password").ok_or_else(|| {
            SqlChatError::Config("password is missing in environment variables".to_string())
        })?;

        let port = match get("port") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                SqlChatError::Config(format!("invalid port '{}': {}", raw, e))
            })?,
            None => DEFAULT_PORT,
        };

        let db = DbConfig {
            host: get("host").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database: get("database").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            user: USERNAME.to_string(),
            password,
        };

        let llm = LlmConfig {
            provider: get("SQLCHAT_PROVIDER").unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            model: get("SQLCHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: get("GOOGLE_API_KEY"),
        };

        let schemas = match get("SQLCHAT_SCHEMAS") {
            Some(raw) => parse_schema_list(&raw),
            None => vec![DEFAULT_SCHEMA.to_string()],
        };

        let target_schema =
            get("SQLCHAT_TARGET_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

        Ok(Self {
            db,
            llm,
            schemas,
            target_schema,
        })
    }
}

/// comma separated schema names; `*` selects every user schema
fn parse_schema_list(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return Vec::new();
    }

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_password_is_fatal() {
        let result = AppConfig::from_lookup(lookup_from(&[("host", "db.local")]));
        assert!(matches!(result, Err(SqlChatError::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("password", "secret")])).unwrap();
        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.db.user, "postgres");
        assert_eq!(config.llm.provider, "google-gemini");
        assert_eq!(config.llm.model, "gemini-2.0-flash-001");
        assert_eq!(config.schemas, vec!["location_management"]);
        assert_eq!(config.target_schema, "location_management");
    }

    #[test]
    fn test_overrides_and_schema_list() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("password", "secret"),
            ("host", "db.internal"),
            ("port", "6543"),
            ("database", "geo"),
            ("SQLCHAT_SCHEMAS", "sales, inventory ,"),
        ]))
        .unwrap();

        assert_eq!(config.db.host, "db.internal");
        assert_eq!(config.db.port, 6543);
        assert_eq!(config.db.database, "geo");
        assert_eq!(config.schemas, vec!["sales", "inventory"]);
    }

    #[test]
    fn test_wildcard_schema_list_means_all() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("password", "secret"),
            ("SQLCHAT_SCHEMAS", "*"),
        ]))
        .unwrap();
        assert!(config.schemas.is_empty());
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("password", "secret"),
            ("port", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env_vars");
        std::fs::write(&path, "SQLCHAT_ENV_FILE_TEST_MARKER=loaded\n").unwrap();

        assert!(AppConfig::load_env_file(&path).unwrap());
        assert_eq!(env::var("SQLCHAT_ENV_FILE_TEST_MARKER").unwrap(), "loaded");
        assert!(!AppConfig::load_env_file(&dir.path().join("missing")).unwrap());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("password", "hunter2"),
            ("GOOGLE_API_KEY", "key-123"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("key-123"));
    }
}
