//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCESS_TOKEN_KEY, DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_MS, DEFAULT_KEYCHAIN_SERVICE,
    DEFAULT_LOCALE_HEADER, DEFAULT_LOGIN_PATH, DEFAULT_MAX_ATTEMPTS, DEFAULT_READ_TTL_MS,
    DEFAULT_REFRESH_PATH, DEFAULT_RETURN_PARAM, LOCALE_KEY, REFRESH_TOKEN_KEY,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub login: LoginConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is appended to (e.g. "https://api.example.com/v1")
    pub base_url: String,
    pub timeout_ms: u64,
    /// Path of the token refresh endpoint, relative to `base_url`
    pub refresh_path: String,
    /// Header carrying the stored locale preference
    pub locale_header: String,
    /// TTL applied to reads that do not pass one explicitly (0 = never cached)
    pub default_ttl_ms: u64,
    /// Transport attempts for requests that get no response at all
    pub max_attempts: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_ms: DEFAULT_API_TIMEOUT_MS,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            locale_header: DEFAULT_LOCALE_HEADER.to_string(),
            default_ttl_ms: DEFAULT_READ_TTL_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ApiConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache lifetime for reads that do not choose their own.
    ///
    /// Zero keeps reads uncached (still coalesced).
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

/// Credential store naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Keychain service name the credentials are stored under
    pub service_name: String,
    pub access_token_key: String,
    pub refresh_token_key: String,
    pub locale_key: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            access_token_key: ACCESS_TOKEN_KEY.to_string(),
            refresh_token_key: REFRESH_TOKEN_KEY.to_string(),
            locale_key: LOCALE_KEY.to_string(),
        }
    }
}

/// Where an expired session is sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub path: String,
    /// Query parameter carrying the location to return to after login
    pub return_param: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self { path: DEFAULT_LOGIN_PATH.to_string(), return_param: DEFAULT_RETURN_PARAM.to_string() }
    }
}
