//! Dashboard configuration.
//!
//! [`DashboardConfig`] is resolved once at startup and passed to every
//! component that needs it. Values come from command-line flags (which
//! also read the environment) and fall back to the persisted
//! [`Settings`] store, then to built-in defaults.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use crate::consts::{
    DEFAULT_CACHE_TTL, DEFAULT_PENDING_PHASE, DEFAULT_TITLE, DEFAULT_TRIGGER_TIMEOUT,
    TRIGGER_FUNCTION_PATH,
};

/// Keys accepted by the settings store.
pub const SETTING_KEYS: &[&str] = &[
    "store_url",
    "read_key",
    "write_key",
    "trigger_endpoint",
    "title",
    "pending_phase",
    "cache_ttl_secs",
    "trigger_timeout_secs",
];

/// Keys whose values are credentials and must not be echoed.
const SECRET_KEYS: &[&str] = &["read_key", "write_key"];

/// A configuration value is missing or unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is not configured")]
    Missing { key: &'static str },
    #[error("{key} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Persistent key-value settings backed by SQLite.
pub struct Settings {
    conn: Mutex<Connection>,
}

impl Settings {
    /// Open or create the settings table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open settings database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create settings table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("settings connection poisoned"))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Set a value (upsert). Unknown keys are rejected.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if !SETTING_KEYS.contains(&key) {
            bail!(
                "unknown setting: {key} (expected one of: {})",
                SETTING_KEYS.join(", ")
            );
        }
        if key.ends_with("_secs") {
            value
                .parse::<u64>()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(())
    }

    /// All stored pairs, sorted by key.
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key ASC")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }
}

/// Values given explicitly at startup. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub store_url: Option<String>,
    pub read_key: Option<String>,
    pub write_key: Option<String>,
    pub trigger_endpoint: Option<String>,
    pub title: Option<String>,
    pub pending_phase: Option<String>,
    pub cache_ttl: Option<Duration>,
    pub trigger_timeout: Option<Duration>,
}

/// Everything the dashboard needs to talk to the store and the scorer.
///
/// Connection fields stay optional: a missing value is reported in the
/// view when it is needed, not at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub store_url: Option<String>,
    pub read_key: Option<String>,
    pub write_key: Option<String>,
    pub trigger_endpoint: Option<String>,
    pub title: String,
    pub pending_phase: String,
    pub cache_ttl: Duration,
    pub trigger_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            read_key: None,
            write_key: None,
            trigger_endpoint: None,
            title: DEFAULT_TITLE.to_string(),
            pending_phase: DEFAULT_PENDING_PHASE.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            trigger_timeout: DEFAULT_TRIGGER_TIMEOUT,
        }
    }
}

impl DashboardConfig {
    /// Merge overrides over stored settings over defaults.
    pub fn resolve(overrides: ConfigOverrides, settings: Option<&Settings>) -> Result<Self> {
        let stored = |key: &str| -> Result<Option<String>> {
            match settings {
                Some(s) => Ok(s.get(key)?.filter(|v| !v.trim().is_empty())),
                None => Ok(None),
            }
        };
        let stored_secs = |key: &str| -> Result<Option<Duration>> {
            stored(key)?
                .map(|v| {
                    v.parse::<u64>()
                        .map(Duration::from_secs)
                        .with_context(|| format!("stored {key} is not a number: {v}"))
                })
                .transpose()
        };
        let given = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            store_url: given(overrides.store_url).map_or_else(|| stored("store_url"), |v| Ok(Some(v)))?,
            read_key: given(overrides.read_key).map_or_else(|| stored("read_key"), |v| Ok(Some(v)))?,
            write_key: given(overrides.write_key).map_or_else(|| stored("write_key"), |v| Ok(Some(v)))?,
            trigger_endpoint: given(overrides.trigger_endpoint)
                .map_or_else(|| stored("trigger_endpoint"), |v| Ok(Some(v)))?,
            title: given(overrides.title)
                .map_or_else(|| stored("title"), |v| Ok(Some(v)))?
                .unwrap_or(defaults.title),
            pending_phase: given(overrides.pending_phase)
                .map_or_else(|| stored("pending_phase"), |v| Ok(Some(v)))?
                .unwrap_or(defaults.pending_phase),
            cache_ttl: match overrides.cache_ttl {
                Some(ttl) => ttl,
                None => stored_secs("cache_ttl_secs")?.unwrap_or(defaults.cache_ttl),
            },
            trigger_timeout: match overrides.trigger_timeout {
                Some(t) => t,
                None => stored_secs("trigger_timeout_secs")?.unwrap_or(defaults.trigger_timeout),
            },
        })
    }

    pub fn store_url(&self) -> Result<&str, ConfigError> {
        self.store_url
            .as_deref()
            .ok_or(ConfigError::Missing { key: "store_url" })
    }

    pub fn read_key(&self) -> Result<&str, ConfigError> {
        self.read_key
            .as_deref()
            .ok_or(ConfigError::Missing { key: "read_key" })
    }

    pub fn write_key(&self) -> Result<&str, ConfigError> {
        self.write_key
            .as_deref()
            .ok_or(ConfigError::Missing { key: "write_key" })
    }

    /// The scoring endpoint: explicit, or derived from the store URL.
    pub fn trigger_url(&self) -> Result<String, ConfigError> {
        if let Some(endpoint) = &self.trigger_endpoint {
            return Ok(endpoint.clone());
        }
        let base = self.store_url().map_err(|_| ConfigError::Missing {
            key: "trigger_endpoint",
        })?;
        Ok(format!("{}{}", base.trim_end_matches('/'), TRIGGER_FUNCTION_PATH))
    }
}

/// Show whether a credential is set without revealing it.
pub fn redact(secret: Option<&str>) -> String {
    match secret {
        None => "not set".to_string(),
        Some(s) if s.chars().count() <= 8 => "set".to_string(),
        Some(s) => {
            let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("set (...{tail})")
        }
    }
}

/// Display form of a stored setting value.
pub fn display_value(key: &str, value: &str) -> String {
    if SECRET_KEYS.contains(&key) {
        redact(Some(value))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_settings() -> Settings {
        Settings::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let settings = mem_settings();
        assert!(settings.get("store_url").unwrap().is_none());
    }

    #[test]
    fn set_and_get() {
        let settings = mem_settings();
        settings.set("store_url", "https://db.example.com").unwrap();
        assert_eq!(
            settings.get("store_url").unwrap().unwrap(),
            "https://db.example.com"
        );
    }

    #[test]
    fn set_overwrites_existing() {
        let settings = mem_settings();
        settings.set("title", "old").unwrap();
        settings.set("title", "new").unwrap();
        assert_eq!(settings.get("title").unwrap().unwrap(), "new");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let settings = mem_settings();
        let err = settings.set("colour", "blue").unwrap_err();
        assert!(err.to_string().contains("unknown setting"));
    }

    #[test]
    fn set_rejects_non_numeric_seconds() {
        let settings = mem_settings();
        assert!(settings.set("cache_ttl_secs", "soon").is_err());
        settings.set("cache_ttl_secs", "30").unwrap();
    }

    #[test]
    fn remove_deletes_key() {
        let settings = mem_settings();
        settings.set("title", "x").unwrap();
        settings.remove("title").unwrap();
        assert!(settings.get("title").unwrap().is_none());
    }

    #[test]
    fn list_is_sorted() {
        let settings = mem_settings();
        settings.set("title", "T").unwrap();
        settings.set("read_key", "k").unwrap();
        let keys: Vec<String> = settings.list().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["read_key", "title"]);
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings-test.db");
        let path_str = path.to_str().unwrap();

        {
            let settings = Settings::open(path_str).unwrap();
            settings.set("title", "persisted").unwrap();
        }

        {
            let settings = Settings::open(path_str).unwrap();
            assert_eq!(settings.get("title").unwrap().unwrap(), "persisted");
        }
    }

    #[test]
    fn resolve_defaults() {
        let config = DashboardConfig::resolve(ConfigOverrides::default(), None).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.pending_phase, DEFAULT_PENDING_PHASE);
    }

    #[test]
    fn overrides_beat_stored_values() {
        let settings = mem_settings();
        settings.set("store_url", "https://stored.example.com").unwrap();
        settings.set("title", "Stored title").unwrap();
        settings.set("cache_ttl_secs", "10").unwrap();

        let overrides = ConfigOverrides {
            store_url: Some("https://flag.example.com".to_string()),
            ..ConfigOverrides::default()
        };
        let config = DashboardConfig::resolve(overrides, Some(&settings)).unwrap();

        assert_eq!(config.store_url.as_deref(), Some("https://flag.example.com"));
        assert_eq!(config.title, "Stored title");
        assert_eq!(config.cache_ttl, Duration::from_secs(10));
    }

    #[test]
    fn blank_override_falls_through() {
        let settings = mem_settings();
        settings.set("read_key", "stored-key").unwrap();
        let overrides = ConfigOverrides {
            read_key: Some("  ".to_string()),
            ..ConfigOverrides::default()
        };
        let config = DashboardConfig::resolve(overrides, Some(&settings)).unwrap();
        assert_eq!(config.read_key.as_deref(), Some("stored-key"));
    }

    #[test]
    fn missing_keys_are_config_errors() {
        let config = DashboardConfig::default();
        assert_eq!(
            config.write_key().unwrap_err(),
            ConfigError::Missing { key: "write_key" }
        );
        assert_eq!(
            config.store_url().unwrap_err().to_string(),
            "store_url is not configured"
        );
    }

    #[test]
    fn trigger_url_derived_from_store_url() {
        let config = DashboardConfig {
            store_url: Some("https://abc.supabase.co/".to_string()),
            ..DashboardConfig::default()
        };
        assert_eq!(
            config.trigger_url().unwrap(),
            "https://abc.supabase.co/functions/v1/evaluar_ofertas_sigsel"
        );
    }

    #[test]
    fn explicit_trigger_endpoint_wins() {
        let config = DashboardConfig {
            store_url: Some("https://abc.supabase.co".to_string()),
            trigger_endpoint: Some("https://fn.example.com/score".to_string()),
            ..DashboardConfig::default()
        };
        assert_eq!(config.trigger_url().unwrap(), "https://fn.example.com/score");
    }

    #[test]
    fn trigger_url_needs_something() {
        let config = DashboardConfig::default();
        assert_eq!(
            config.trigger_url().unwrap_err(),
            ConfigError::Missing {
                key: "trigger_endpoint"
            }
        );
    }

    #[test]
    fn redact_hides_secrets() {
        assert_eq!(redact(None), "not set");
        assert_eq!(redact(Some("short")), "set");
        assert_eq!(redact(Some("eyJhbGciOiJIUzI1NiJ9.secret-tail")), "set (...tail)");
        assert_eq!(display_value("write_key", "eyJhbGciOiJIUzI1NiJ9.abcd"), "set (...abcd)");
        assert_eq!(display_value("title", "Hello"), "Hello");
    }
}
