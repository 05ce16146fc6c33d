//! Single-flight access token refresh
//!
//! However many requests hit a 401 at once, one refresh call goes out and
//! every one of them waits for its outcome.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use lingua_common::CredentialStore;
use lingua_domain::{RefreshRequest, RefreshResponse};
use parking_lot::Mutex;
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use super::dispatcher::Dispatcher;
use super::errors::ApiError;
use super::interceptor::{CredentialKeys, OutgoingInterceptor};
use super::request::ApiRequest;

/// Exchanges a refresh token for new credentials
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError>;
}

/// Calls the refresh endpoint directly through the dispatcher.
///
/// The call bypasses the client pipeline, so a 401 from the refresh
/// endpoint can never trigger another refresh.
pub struct HttpTokenRefresher {
    dispatcher: Arc<dyn Dispatcher>,
    outgoing: OutgoingInterceptor,
    refresh_path: String,
}

impl HttpTokenRefresher {
    /// Refresher posting to `refresh_path` through `dispatcher`
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        outgoing: OutgoingInterceptor,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self { dispatcher, outgoing, refresh_path: refresh_path.into() }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let body = serde_json::to_value(RefreshRequest { refresh_token: refresh_token.to_string() })
            .map_err(|err| ApiError::Encode(err.to_string()))?;
        let mut request = ApiRequest::new(Method::POST, self.refresh_path.clone()).with_body(Some(body));
        self.outgoing.attach_locale(&mut request);

        let response = self.dispatcher.dispatch(&request).await?;
        serde_json::from_value(response.body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

type SharedToken = Shared<BoxFuture<'static, Result<String, ApiError>>>;

/// Owns the at-most-one pending refresh.
#[derive(Clone)]
pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    store: Arc<dyn CredentialStore>,
    keys: CredentialKeys,
    pending: Arc<Mutex<Option<SharedToken>>>,
}

impl RefreshCoordinator {
    /// Coordinator storing refreshed tokens in `store` under `keys`
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        store: Arc<dyn CredentialStore>,
        keys: CredentialKeys,
    ) -> Self {
        Self { refresher, store, keys, pending: Arc::new(Mutex::new(None)) }
    }

    /// Obtain a fresh access token, joining the refresh already underway
    /// if there is one. On success the new token is already stored.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let pending = {
            let mut slot = self.pending.lock();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    let refresh_token = self.refresh_token()?;
                    let pending = self.start(refresh_token);
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// True while a refresh is underway
    pub fn is_refreshing(&self) -> bool {
        self.pending.lock().is_some()
    }

    fn refresh_token(&self) -> Result<String, ApiError> {
        match self.store.get(&self.keys.refresh_token) {
            Ok(Some(token)) if !token.is_empty() => Ok(token),
            Ok(_) => Err(ApiError::AuthRecovery("no refresh token available".into())),
            Err(err) => Err(ApiError::AuthRecovery(format!("refresh token unreadable: {err}"))),
        }
    }

    // Called with the slot locked; the task's final clear waits on that lock,
    // so it can never run before the handle is stored.
    fn start(&self, refresh_token: String) -> SharedToken {
        let coordinator = self.clone();
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(coordinator.exchange(refresh_token))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ApiError::AuthRecovery("token refresh panicked".into())));
            *coordinator.pending.lock() = None;
            outcome
        });

        async move {
            task.await.unwrap_or_else(|err| {
                Err(ApiError::AuthRecovery(format!("token refresh task failed: {err}")))
            })
        }
        .boxed()
        .shared()
    }

    async fn exchange(&self, refresh_token: String) -> Result<String, ApiError> {
        let response = self.refresher.refresh_access_token(&refresh_token).await.map_err(|err| {
            warn!(error = %err, "token refresh failed");
            match err {
                ApiError::AuthRecovery(message) => ApiError::AuthRecovery(message),
                other => ApiError::AuthRecovery(other.to_string()),
            }
        })?;

        self.store
            .set(&self.keys.access_token, &response.access_token)
            .map_err(|err| ApiError::AuthRecovery(format!("failed to store access token: {err}")))?;
        if let Some(rotated) = &response.refresh_token {
            self.store.set(&self.keys.refresh_token, rotated).map_err(|err| {
                ApiError::AuthRecovery(format!("failed to store refresh token: {err}"))
            })?;
        }

        info!(rotated = response.refresh_token.is_some(), "access token refreshed");
        Ok(response.access_token)
    }
}
