//! Outgoing request decoration from the credential store

use std::sync::Arc;

use lingua_common::CredentialStore;
use lingua_domain::CredentialsConfig;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::warn;

use super::errors::ApiError;
use super::request::ApiRequest;

/// Store keys the client reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    pub access_token: String,
    pub refresh_token: String,
    pub locale: String,
}

impl From<&CredentialsConfig> for CredentialKeys {
    fn from(config: &CredentialsConfig) -> Self {
        Self {
            access_token: config.access_token_key.clone(),
            refresh_token: config.refresh_token_key.clone(),
            locale: config.locale_key.clone(),
        }
    }
}

impl Default for CredentialKeys {
    fn default() -> Self {
        Self::from(&CredentialsConfig::default())
    }
}

impl CredentialKeys {
    /// Every key a session writes, for clearing it
    pub fn all(&self) -> [&str; 3] {
        [&self.access_token, &self.refresh_token, &self.locale]
    }
}

/// Attaches the stored access token and locale to every request.
///
/// Decoration is synchronous and never fails: a store that cannot be read
/// is logged and treated as empty.
#[derive(Clone)]
pub struct OutgoingInterceptor {
    store: Arc<dyn CredentialStore>,
    keys: CredentialKeys,
    locale_header: HeaderName,
}

impl OutgoingInterceptor {
    /// Interceptor reading from `store` under `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if `locale_header` is not a valid header name.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        keys: CredentialKeys,
        locale_header: &str,
    ) -> Result<Self, ApiError> {
        let locale_header = HeaderName::from_bytes(locale_header.as_bytes()).map_err(|err| {
            ApiError::Config(format!("invalid locale header name '{locale_header}': {err}"))
        })?;
        Ok(Self { store, keys, locale_header })
    }

    /// Attach the bearer token and the locale header when stored.
    ///
    /// A store that cannot be read leaves the request anonymous.
    pub fn decorate(&self, request: &mut ApiRequest) {
        if let Some(token) = self.access_token() {
            request.set_bearer(&token);
        }
        self.attach_locale(request);
    }

    /// Locale only; used for the refresh call, which must not carry a
    /// possibly expired bearer token.
    pub fn attach_locale(&self, request: &mut ApiRequest) {
        let Some(locale) = self.read(&self.keys.locale) else {
            return;
        };
        match HeaderValue::from_str(&locale) {
            Ok(value) => {
                request.headers.insert(self.locale_header.clone(), value);
            }
            Err(err) => warn!(error = %err, "stored locale is not a valid header value"),
        }
    }

    /// Currently stored access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.read(&self.keys.access_token)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|value| !value.is_empty()),
            Err(err) => {
                warn!(key, error = %err, "credential store read failed; treating as absent");
                None
            }
        }
    }
}
