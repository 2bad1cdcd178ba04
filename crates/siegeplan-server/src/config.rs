// Server configuration: optional config/server.toml plus credentials from the
// process environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use siegeplan_llm::client::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_TEMPERATURE};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_TRACKER_BASE_URL: &str =
    "https://public-api.tracker.gg/v2/r6siege/standard/profile";

pub const TRACKER_KEY_VAR: &str = "TRN_API_KEY";
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
pub const PORT_VAR: &str = "PORT";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("missing required credential: set the {var} environment variable")]
    MissingCredential { var: &'static str },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerSection,
    pub tracker: TrackerSection,
    pub gemini: GeminiSection,
    pub credentials: Credentials,
}

/// Raw deserialization target for config/server.toml. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerSection,
    tracker: TrackerSection,
    gemini: GeminiSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: u16,
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    pub base_url: String,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TRACKER_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiSection {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// API keys. Never logged; `Debug` is redacted.
#[derive(Clone)]
pub struct Credentials {
    pub tracker_api_key: String,
    pub gemini_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tracker_api_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration relative to `base_dir`, reading
/// environment variables through `env`.
///
/// `config/server.toml` is optional; missing tables and keys take defaults.
pub fn load_config_from<F>(base_dir: &Path, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = base_dir.join("config").join("server.toml");
    let file = if path.exists() {
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;
        toml::from_str::<ConfigFile>(&text).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?
    } else {
        ConfigFile::default()
    };

    let mut server = file.server;
    if let Some(raw) = env(PORT_VAR) {
        server.port = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::ValidationError {
                field: PORT_VAR.into(),
                message: format!("not a valid port: {raw:?}"),
            })?;
    }

    let credentials = Credentials {
        tracker_api_key: require(&env, TRACKER_KEY_VAR)?,
        gemini_api_key: require(&env, GEMINI_KEY_VAR)?,
    };

    let config = Config {
        server,
        tracker: file.tracker,
        gemini: file.gemini,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working
/// directory using the real process environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::ReadError {
        path: PathBuf::from("."),
        source: e,
    })?;
    load_config_from(&cwd, |key| std::env::var(key).ok())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require<F>(env: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match env(var) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingCredential { var }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.server.bind.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "server.bind".into(),
            message: "must not be empty".into(),
        });
    }

    for (field, url) in [
        ("tracker.base_url", &config.tracker.base_url),
        ("gemini.base_url", &config.gemini.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                field: field.into(),
                message: format!("must be an http(s) URL, got {url:?}"),
            });
        }
    }

    if config.gemini.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "gemini.model".into(),
            message: "must not be empty".into(),
        });
    }

    let t = config.gemini.temperature;
    if !(0.0..=2.0).contains(&t) {
        return Err(ConfigError::ValidationError {
            field: "gemini.temperature".into(),
            message: format!("must be between 0.0 and 2.0 inclusive, got {t}"),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env_of(&[(TRACKER_KEY_VAR, "trn-key"), (GEMINI_KEY_VAR, "gem-key")])
    }

    /// A fresh temp dir with an optional config/server.toml.
    fn temp_base(name: &str, toml: Option<&str>) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("siegeplan_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        if let Some(text) = toml {
            fs::write(tmp.join("config").join("server.toml"), text).unwrap();
        }
        tmp
    }

    #[test]
    fn defaults_without_config_file() {
        let base = temp_base("defaults", None);
        let config = load_config_from(&base, full_env()).unwrap();

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.tracker.base_url, DEFAULT_TRACKER_BASE_URL);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert!((config.gemini.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.credentials.tracker_api_key, "trn-key");
        assert_eq!(config.credentials.gemini_api_key, "gem-key");

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let base = temp_base(
            "partial",
            Some("[server]\nport = 8080\n\n[gemini]\nmodel = \"gemini-2.0-pro\"\n"),
        );
        let config = load_config_from(&base, full_env()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.gemini.model, "gemini-2.0-pro");
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn port_env_var_overrides_file() {
        let base = temp_base("port_env", Some("[server]\nport = 8080\n"));
        let env = env_of(&[
            (TRACKER_KEY_VAR, "a"),
            (GEMINI_KEY_VAR, "b"),
            (PORT_VAR, "4100"),
        ]);
        let config = load_config_from(&base, env).unwrap();
        assert_eq!(config.server.port, 4100);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn invalid_port_env_var_is_rejected() {
        let base = temp_base("port_bad", None);
        let env = env_of(&[
            (TRACKER_KEY_VAR, "a"),
            (GEMINI_KEY_VAR, "b"),
            (PORT_VAR, "not-a-port"),
        ]);
        let err = load_config_from(&base, env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "PORT"));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn missing_tracker_key_is_fatal() {
        let base = temp_base("no_trn", None);
        let err = load_config_from(&base, env_of(&[(GEMINI_KEY_VAR, "b")])).unwrap_err();
        match err {
            ConfigError::MissingCredential { var } => assert_eq!(var, "TRN_API_KEY"),
            other => panic!("expected MissingCredential, got {other:?}"),
        }

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn blank_gemini_key_is_fatal() {
        let base = temp_base("blank_gemini", None);
        let env = env_of(&[(TRACKER_KEY_VAR, "a"), (GEMINI_KEY_VAR, "   ")]);
        let err = load_config_from(&base, env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential {
                var: "GEMINI_API_KEY"
            }
        ));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let base = temp_base("malformed", Some("[server\nport = "));
        let err = load_config_from(&base, full_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            ("zero_port", "[server]\nport = 0\n", "server.port"),
            (
                "bad_url",
                "[tracker]\nbase_url = \"ftp://example.com\"\n",
                "tracker.base_url",
            ),
            ("empty_model", "[gemini]\nmodel = \"\"\n", "gemini.model"),
            ("hot", "[gemini]\ntemperature = 2.5\n", "gemini.temperature"),
        ];
        for (name, toml, expected) in cases {
            let base = temp_base(name, Some(toml));
            let err = load_config_from(&base, full_env()).unwrap_err();
            match err {
                ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
                other => panic!("{name}: expected ValidationError, got {other:?}"),
            }
            let _ = fs::remove_dir_all(&base);
        }
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            tracker_api_key: "secret-1".into(),
            gemini_api_key: "secret-2".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret"));
    }
}
