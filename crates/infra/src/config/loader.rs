//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the base URL is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `LINGUA_API_BASE_URL`: API base URL (required)
//! - `LINGUA_API_TIMEOUT_MS`: Request timeout in milliseconds
//! - `LINGUA_API_REFRESH_PATH`: Token refresh endpoint path
//! - `LINGUA_API_LOCALE_HEADER`: Header carrying the locale preference
//! - `LINGUA_API_DEFAULT_TTL_MS`: Default read TTL in milliseconds
//! - `LINGUA_API_MAX_ATTEMPTS`: Transport attempts for no-response failures
//! - `LINGUA_KEYCHAIN_SERVICE`: Keychain service name for credentials
//! - `LINGUA_LOGIN_PATH`: Login location for expired sessions
//! - `LINGUA_LOGIN_RETURN_PARAM`: Query parameter carrying the return location
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./lingua.json` or `./lingua.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use lingua_domain::{ApiConfig, Config, CredentialsConfig, LinguaError, LoginConfig, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set, falls back to loading from a config file.
///
/// # Errors
/// Returns `LinguaError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value cannot be parsed
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `LINGUA_API_BASE_URL` is required; every other setting falls back
/// to its default.
///
/// # Errors
/// Returns `LinguaError::Config` if the base URL is missing or a numeric
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let api_defaults = ApiConfig::default();
    let credentials_defaults = CredentialsConfig::default();
    let login_defaults = LoginConfig::default();

    let base_url = env_var("LINGUA_API_BASE_URL")?;

    let api = ApiConfig {
        base_url,
        timeout_ms: env_parse("LINGUA_API_TIMEOUT_MS", api_defaults.timeout_ms)?,
        refresh_path: env_or("LINGUA_API_REFRESH_PATH", api_defaults.refresh_path),
        locale_header: env_or("LINGUA_API_LOCALE_HEADER", api_defaults.locale_header),
        default_ttl_ms: env_parse("LINGUA_API_DEFAULT_TTL_MS", api_defaults.default_ttl_ms)?,
        max_attempts: env_parse("LINGUA_API_MAX_ATTEMPTS", api_defaults.max_attempts)?,
    };

    let credentials = CredentialsConfig {
        service_name: env_or("LINGUA_KEYCHAIN_SERVICE", credentials_defaults.service_name),
        ..credentials_defaults
    };

    let login = LoginConfig {
        path: env_or("LINGUA_LOGIN_PATH", login_defaults.path),
        return_param: env_or("LINGUA_LOGIN_RETURN_PARAM", login_defaults.return_param),
    };

    Ok(Config { api, credentials, login })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `LinguaError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LinguaError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LinguaError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LinguaError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LinguaError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LinguaError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(LinguaError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(config_candidates(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(config_candidates(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn config_candidates(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("lingua.json"),
        dir.join("lingua.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| LinguaError::Config(format!("Missing required environment variable: {}", key)))
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|value| !value.is_empty()).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| LinguaError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "LINGUA_API_BASE_URL",
        "LINGUA_API_TIMEOUT_MS",
        "LINGUA_API_REFRESH_PATH",
        "LINGUA_API_LOCALE_HEADER",
        "LINGUA_API_DEFAULT_TTL_MS",
        "LINGUA_API_MAX_ATTEMPTS",
        "LINGUA_KEYCHAIN_SERVICE",
        "LINGUA_LOGIN_PATH",
        "LINGUA_LOGIN_RETURN_PARAM",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_only_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("LINGUA_API_BASE_URL", "https://api.lingua.test");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.api.base_url, "https://api.lingua.test");
        assert_eq!(config.api.refresh_path, ApiConfig::default().refresh_path);
        assert_eq!(config.credentials, CredentialsConfig::default());
        assert_eq!(config.login, LoginConfig::default());

        clear_env();
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("LINGUA_API_BASE_URL", "https://api.lingua.test/v2");
        std::env::set_var("LINGUA_API_TIMEOUT_MS", "5000");
        std::env::set_var("LINGUA_API_REFRESH_PATH", "/token/refresh/");
        std::env::set_var("LINGUA_API_LOCALE_HEADER", "X-Locale");
        std::env::set_var("LINGUA_API_DEFAULT_TTL_MS", "30000");
        std::env::set_var("LINGUA_API_MAX_ATTEMPTS", "3");
        std::env::set_var("LINGUA_KEYCHAIN_SERVICE", "Lingua.test");
        std::env::set_var("LINGUA_LOGIN_PATH", "/signin");
        std::env::set_var("LINGUA_LOGIN_RETURN_PARAM", "return_to");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.api.refresh_path, "/token/refresh/");
        assert_eq!(config.api.locale_header, "X-Locale");
        assert_eq!(config.api.default_ttl_ms, 30000);
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.credentials.service_name, "Lingua.test");
        assert_eq!(config.login.path, "/signin");
        assert_eq!(config.login.return_param, "return_to");

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, LinguaError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("LINGUA_API_BASE_URL", "https://api.lingua.test");
        std::env::set_var("LINGUA_API_TIMEOUT_MS", "soon");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, LinguaError::Config(ref msg) if msg.contains("LINGUA_API_TIMEOUT_MS")));

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://api.lingua.test"
default_ttl_ms = 60000

[login]
path = "/welcome"
"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).expect("toml config");
        assert_eq!(config.api.base_url, "https://api.lingua.test");
        assert_eq!(config.api.default_ttl_ms, 60000);
        assert_eq!(config.login.path, "/welcome");
        assert_eq!(config.login.return_param, LoginConfig::default().return_param);
    }

    #[test]
    fn test_load_from_file_json() {
        let mut file: NamedTempFile = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "api": {{ "base_url": "https://api.lingua.test", "max_attempts": 2 }} }}"#)
            .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).expect("json config");
        assert_eq!(config.api.max_attempts, 2);
    }

    #[test]
    fn test_load_from_file_missing() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/lingua.toml"))).unwrap_err();
        assert!(matches!(err, LinguaError::Config(_)));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let err = parse_config("api:\n  base_url: x", Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, LinguaError::Config(ref msg) if msg.contains("yaml")));
    }
}
