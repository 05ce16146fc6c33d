//! Default values for the API access layer.

// API defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REFRESH_PATH: &str = "/auth/token/refresh/";
pub const DEFAULT_LOCALE_HEADER: &str = "Accept-Language";
pub const DEFAULT_READ_TTL_MS: u64 = 0;
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;

// Credential store keys
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Lingua.api";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const LOCALE_KEY: &str = "locale";

// Login redirect
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_RETURN_PARAM: &str = "next";
