use crate::error::AppError;
use crate::rotation::{DEFAULT_PARTICIPANTS, Rotation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "ROTA_CONFIG_PATH";
pub const URL_ENV_VAR: &str = "SUPABASE_URL";
pub const KEY_ENV_VAR: &str = "SUPABASE_KEY";
pub const DEFAULT_TABLE: &str = "cleaning_tasks";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        if self.accent.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.accent, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.map(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            accent: "\x1b[38;5;208m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        Some("meadow") => Palette {
            accent: "\x1b[38;5;108m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    match cleaned.trim_matches('_') {
        "" | "plain" | "light" => "default".to_string(),
        "dark" | "dark_mode" | "darkmode" => "noir".to_string(),
        "green" => "meadow".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_participants")]
    pub participants: Vec<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_participants() -> Vec<String> {
    DEFAULT_PARTICIPANTS.iter().map(|name| name.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            table: None,
            theme: None,
            timeout_secs: None,
        }
    }
}

impl Config {
    pub fn rotation(&self) -> Result<Rotation, AppError> {
        Rotation::new(&self.participants)
    }

    pub fn table_name(&self) -> &str {
        self.table
            .as_deref()
            .map(str::trim)
            .filter(|table| !table.is_empty())
            .unwrap_or(DEFAULT_TABLE)
    }

    /// Request timeout, held between one second and [`MAX_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        let secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs.clamp(1, MAX_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub participants: Option<Vec<String>>,
    pub table: Option<String>,
    pub theme: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Endpoint and access key of the hosted table.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl StoreCredentials {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let missing: Vec<&str> = [URL_ENV_VAR, KEY_ENV_VAR]
            .into_iter()
            .filter(|name| read(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::config_missing(format!(
                "{} must be set in the environment or a .env file",
                missing.join(" and ")
            )));
        }

        Ok(Self {
            url: read(URL_ENV_VAR).unwrap_or_default(),
            key: read(KEY_ENV_VAR).unwrap_or_default(),
        })
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("rota").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("rota")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.rotation().map_err(|err| {
        AppError::invalid_data(format!("{}: {}", path.display(), err.message()))
    })?;
    Ok(normalize_config_theme(config))
}

fn normalize_config_theme(mut config: Config) -> Config {
    config.theme = config.theme.map(|name| canonical_theme_name(&name));
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(participants) = overrides.participants.as_ref() {
        merged.participants = participants.clone();
    }
    if let Some(table) = overrides.table.as_ref() {
        merged.table = Some(table.clone());
    }
    if let Some(theme) = overrides.theme.as_ref() {
        merged.theme = Some(canonical_theme_name(theme));
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        merged.timeout_secs = Some(timeout_secs);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, DEFAULT_TABLE, MAX_TIMEOUT_SECS, StoreCredentials,
        canonical_theme_name, load_config_from_path, load_config_with_fallback_from_path,
        merge_overrides, palette_for_theme,
    };
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("rota-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "participants": ["Ana", "Ben", "Cleo"],
            "table": "chores",
            "theme": "Dark Mode",
            "timeout_secs": 3
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.participants, vec!["Ana", "Ben", "Cleo"]);
        assert_eq!(loaded.table_name(), "chores");
        assert_eq!(loaded.theme.as_deref(), Some("noir"));
        assert_eq!(loaded.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn load_config_rejects_single_participant() {
        let path = temp_path("solo-config.json");
        fs::write(&path, r#"{ "participants": ["Solo"] }"#).unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn defaults_are_two_person_rotation() {
        let config = Config::default();
        assert_eq!(config.participants, vec!["Fernand", "Yvonne"]);
        assert_eq!(config.table_name(), DEFAULT_TABLE);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn timeout_is_held_within_bounds() {
        let huge = Config {
            timeout_secs: Some(u64::MAX),
            ..Config::default()
        };
        assert_eq!(huge.timeout(), Duration::from_secs(MAX_TIMEOUT_SECS));

        let zero = Config {
            timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(zero.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn merge_overrides_replaces_only_given_fields() {
        let base = Config {
            theme: Some("default".into()),
            table: Some("chores".into()),
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            participants: Some(vec!["Ana".into(), "Ben".into()]),
            theme: Some("dark".into()),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.participants, vec!["Ana", "Ben"]);
        assert_eq!(merged.theme.as_deref(), Some("noir"));
        assert_eq!(merged.table.as_deref(), Some("chores"));
        assert_eq!(base.participants, vec!["Fernand", "Yvonne"]);
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("noir".into()),
            ..Config::default()
        };

        let merged = merge_overrides(&base, &ConfigOverrides::default());

        assert_eq!(merged, base);
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Plain"), "default");
        assert_eq!(canonical_theme_name("Noir"), "noir");
        assert_eq!(canonical_theme_name("dark-mode"), "noir");
        assert_eq!(canonical_theme_name("Green"), "meadow");
        assert_eq!(canonical_theme_name("  "), "default");
    }

    #[test]
    fn palette_for_theme_returns_palette() {
        let default_palette = palette_for_theme(Some("plain"));
        assert!(default_palette.accent.is_empty());
        assert_eq!(default_palette.accentize("x"), "x");

        let noir_palette = palette_for_theme(Some("noir"));
        assert_eq!(noir_palette.accent, "\x1b[38;5;208m");
        assert_eq!(noir_palette.accentize("x"), "\x1b[38;5;208mx\x1b[0m");

        let unknown_palette = palette_for_theme(Some("oceanic"));
        assert!(unknown_palette.accent.is_empty());
    }

    #[test]
    fn credentials_require_both_variables() {
        let env: HashMap<&str, &str> = [("SUPABASE_URL", "https://example.supabase.co")]
            .into_iter()
            .collect();
        let err = StoreCredentials::from_lookup(|name| env.get(name).map(|v| v.to_string()))
            .unwrap_err();

        assert_eq!(err.code(), "config_missing");
        assert!(err.message().contains("SUPABASE_KEY"));
    }

    #[test]
    fn credentials_treat_blank_as_missing() {
        let err = StoreCredentials::from_lookup(|_| Some("   ".to_string())).unwrap_err();
        assert_eq!(err.code(), "config_missing");
    }

    #[test]
    fn credentials_are_trimmed_and_key_is_redacted() {
        let credentials = StoreCredentials::from_lookup(|name| match name {
            "SUPABASE_URL" => Some(" https://example.supabase.co ".to_string()),
            "SUPABASE_KEY" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(credentials.url, "https://example.supabase.co");
        assert!(!format!("{credentials:?}").contains("secret"));
    }
}
