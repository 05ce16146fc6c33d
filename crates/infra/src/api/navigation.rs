//! Login redirect on session expiry

use lingua_domain::LoginConfig;
use tracing::warn;
use url::form_urlencoded;

/// Host-side navigation.
///
/// The client calls `redirect` once it has given up on a session; the host
/// decides what "going to login" means (route change, window, CLI prompt).
pub trait Navigator: Send + Sync {
    /// Location the user should come back to after logging in.
    fn current_location(&self) -> String;

    fn redirect(&self, location: &str);
}

/// Navigator for headless hosts: logs the redirect and stays put.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn current_location(&self) -> String {
        "/".to_string()
    }

    fn redirect(&self, location: &str) {
        warn!(location, "session expired; login required");
    }
}

/// Builds the login location carrying a return address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    path: String,
    return_param: String,
}

impl LoginRedirect {
    /// Redirect to `path`, passing the return location as `return_param`
    pub fn new(path: impl Into<String>, return_param: impl Into<String>) -> Self {
        Self { path: path.into(), return_param: return_param.into() }
    }

    /// Login location that returns to `return_to` afterwards
    pub fn location_for(&self, return_to: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.return_param, return_to)
            .finish();
        let separator = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.path)
    }
}

impl From<&LoginConfig> for LoginRedirect {
    fn from(config: &LoginConfig) -> Self {
        Self::new(config.path.clone(), config.return_param.clone())
    }
}
