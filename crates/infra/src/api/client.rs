//! API client with cached reads and automatic credential recovery
//!
//! Every call runs the same pipeline: decorate from the credential store,
//! dispatch, recover once from a 401 through the shared refresh, and on a
//! successful write drop every cached read.

use std::sync::Arc;

use futures::FutureExt;
use lingua_common::{Clock, CredentialStore, KeychainCredentialStore, SystemClock};
use lingua_domain::{ApiConfig, Config, Credentials};
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::catalog::Catalog;
use super::dispatcher::{Dispatcher, HttpDispatcher};
use super::errors::ApiError;
use super::facade::{ResourceFacade, ScopeFacade};
use super::fingerprint::Fingerprint;
use super::interceptor::{CredentialKeys, OutgoingInterceptor};
use super::navigation::{LoginRedirect, Navigator, TracingNavigator};
use super::reader::CachedReader;
use super::refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use super::request::{ApiRequest, ApiResponse, Query, ReadOptions};

struct ClientInner {
    config: ApiConfig,
    keys: CredentialKeys,
    login: LoginRedirect,
    store: Arc<dyn CredentialStore>,
    dispatcher: Arc<dyn Dispatcher>,
    outgoing: OutgoingInterceptor,
    reader: CachedReader,
    refresh: RefreshCoordinator,
    navigator: Arc<dyn Navigator>,
    teardown: Mutex<()>,
}

/// Shared API client.
///
/// Cloning is cheap and every clone shares the cache, the in-flight
/// registry and the pending refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Client over `store` with HTTP dispatch and default collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the HTTP client or a configured header
    /// name cannot be built.
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::builder().config(config).store(store).build()
    }

    /// API settings the client was built with
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Cached, coalesced GET of `path`.
    ///
    /// Served from the cache while a live entry exists; otherwise joins an
    /// identical read already underway or dispatches a new one. Successful
    /// results are cached for `options.ttl` (falling back to the configured
    /// default); failures are never cached.
    #[instrument(skip(self, query, options), fields(path = %path))]
    pub async fn read(
        &self,
        path: &str,
        query: &Query,
        options: ReadOptions,
    ) -> Result<Value, ApiError> {
        let fingerprint = Fingerprint::new(&Method::GET, path, query);
        let ttl = options.ttl.unwrap_or_else(|| self.inner.config.default_ttl());
        let request = ApiRequest::get(path).with_query(query.clone());
        let client = self.clone();

        self.inner
            .reader
            .read(fingerprint, ttl, options.dedupe, move || {
                async move { client.send(request).await.map(|response| response.body) }.boxed()
            })
            .await
    }

    /// Uncached request that, on success, invalidates every cached read.
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn mutate(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::new(method, path).with_body(body);
        self.send(request).await.map(|response| response.body)
    }

    /// CRUD facade for the collection at `base_path`.
    pub fn resource(&self, base_path: &str) -> ResourceFacade {
        ResourceFacade::new(self.clone(), base_path)
    }

    /// Facade for the endpoints grouped under `prefix`.
    pub fn scope(&self, prefix: &str) -> ScopeFacade {
        ScopeFacade::new(self.clone(), prefix)
    }

    /// Named facades for the platform's resources.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.clone())
    }

    /// Drop every cached read. Reads already underway still settle their
    /// callers but do not repopulate the cache.
    pub fn invalidate_all(&self) -> usize {
        let dropped = self.inner.reader.invalidate_all();
        debug!(dropped, "response cache invalidated");
        dropped
    }

    /// Number of live cached reads
    pub fn cached_entries(&self) -> usize {
        self.inner.reader.cached_entries()
    }

    /// Refresh the access token now, joining any refresh already underway.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        self.inner.refresh.refresh().await
    }

    /// Persist credentials obtained from a login flow.
    pub fn store_credentials(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let store = &self.inner.store;
        store
            .set(&self.inner.keys.access_token, &credentials.access_token)
            .map_err(|err| ApiError::Internal(format!("failed to store access token: {err}")))?;
        let refresh_written = match &credentials.refresh_token {
            Some(refresh) => store.set(&self.inner.keys.refresh_token, refresh),
            None => store.remove(&self.inner.keys.refresh_token),
        };
        refresh_written
            .map_err(|err| ApiError::Internal(format!("failed to store refresh token: {err}")))?;

        info!(has_refresh = credentials.refresh_token.is_some(), "credentials stored");
        Ok(())
    }

    /// Locale sent with every subsequent request.
    pub fn set_locale(&self, locale: &str) -> Result<(), ApiError> {
        self.inner
            .store
            .set(&self.inner.keys.locale, locale)
            .map_err(|err| ApiError::Internal(format!("failed to store locale: {err}")))
    }

    /// Forget the session: clear the credential store and every cached read.
    pub fn logout(&self) {
        self.clear_credentials();
        self.invalidate_all();
        info!("logged out");
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let is_write = request.is_write();
        let response = self.send_with_recovery(request).await?;
        if is_write {
            self.invalidate_all();
        }
        Ok(response)
    }

    async fn send_with_recovery(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.inner.outgoing.decorate(&mut request);

        let outcome = self.inner.dispatcher.dispatch(&request).await;
        match outcome {
            Err(err) if err.is_unauthorized() && self.can_recover(&request) => {
                self.recover(request).await
            }
            outcome => outcome,
        }
    }

    fn can_recover(&self, request: &ApiRequest) -> bool {
        !request.is_retry && !same_path(&request.path, &self.inner.config.refresh_path)
    }

    /// Re-dispatch a request rejected with 401, exactly once.
    async fn recover(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        // Another request may already have refreshed while this one was on
        // the wire; its token is then used without refreshing again.
        let stored = self.inner.outgoing.access_token();
        let token = match stored {
            Some(current) if request.bearer_token() != Some(current.as_str()) => {
                debug!(path = %request.path, "retrying with token refreshed meanwhile");
                current
            }
            _ => match self.inner.refresh.refresh().await {
                Ok(token) => token,
                Err(err) => return Err(self.expire_session(request.bearer_token(), err)),
            },
        };

        request.set_bearer(&token);
        request.is_retry = true;
        debug!(path = %request.path, "retrying after credential refresh");
        self.inner.dispatcher.dispatch(&request).await
    }

    /// End the session the failed request belonged to.
    ///
    /// Only the first of several requests failing on one refresh tears the
    /// session down; the rest see their token already gone and just report
    /// the expiry.
    fn expire_session(&self, carried: Option<&str>, cause: ApiError) -> ApiError {
        let login_location = self.inner.login.location_for(&self.inner.navigator.current_location());

        let _teardown = self.inner.teardown.lock();
        if self.inner.outgoing.access_token().as_deref() != carried {
            debug!(error = %cause, "session already ended by a concurrent request");
            return ApiError::SessionExpired { login_location };
        }

        warn!(error = %cause, "credential recovery failed; ending session");
        self.clear_credentials();
        self.inner.reader.invalidate_all();
        self.inner.navigator.redirect(&login_location);
        ApiError::SessionExpired { login_location }
    }

    fn clear_credentials(&self) {
        for key in self.inner.keys.all() {
            if let Err(err) = self.inner.store.remove(key) {
                warn!(key, error = %err, "failed to clear credential");
            }
        }
    }
}

fn same_path(a: &str, b: &str) -> bool {
    a.trim_matches('/') == b.trim_matches('/')
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<Config>,
    store: Option<Arc<dyn CredentialStore>>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the credential store
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace HTTP dispatch (tests, alternative transports)
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Replace the refresh call (defaults to a POST to the refresh path)
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Set where session expiry redirects to
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Set the clock used for cache expiry
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the API client
    ///
    /// Without an explicit store the platform keychain is used.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client or the locale header cannot be built
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let keys = CredentialKeys::from(&config.credentials);

        let store: Arc<dyn CredentialStore> = match self.store {
            Some(store) => store,
            None => Arc::new(KeychainCredentialStore::new(config.credentials.service_name.clone())),
        };
        let dispatcher: Arc<dyn Dispatcher> = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => Arc::new(HttpDispatcher::from_config(&config.api)?),
        };
        let outgoing =
            OutgoingInterceptor::new(Arc::clone(&store), keys.clone(), &config.api.locale_header)?;
        let refresher: Arc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(HttpTokenRefresher::new(
                Arc::clone(&dispatcher),
                outgoing.clone(),
                config.api.refresh_path.clone(),
            )),
        };
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let navigator: Arc<dyn Navigator> =
            self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator));

        let refresh = RefreshCoordinator::new(refresher, Arc::clone(&store), keys.clone());

        info!(base_url = %config.api.base_url, "api client ready");

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                login: LoginRedirect::from(&config.login),
                config: config.api,
                keys,
                store,
                dispatcher,
                outgoing,
                reader: CachedReader::new(clock),
                refresh,
                navigator,
                teardown: Mutex::new(()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use lingua_common::MemoryCredentialStore;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer, store: Arc<MemoryCredentialStore>) -> ApiClient {
        let mut config = Config::default();
        config.api.base_url = server.uri();
        ApiClient::new(config, store).expect("client")
    }

    #[test]
    fn refresh_path_comparison_ignores_slashes() {
        assert!(same_path("/auth/token/refresh/", "auth/token/refresh"));
        assert!(!same_path("/auth/token/", "/auth/token/refresh/"));
    }

    #[tokio::test]
    async fn read_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/languages/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::with_entries([("access_token", "A1")]));
        let value = client(&server, store)
            .read("/languages/", &Query::new(), ReadOptions::default())
            .await
            .unwrap();

        assert_eq!(value, json!([{ "id": 1 }]));
    }

    #[tokio::test]
    async fn store_credentials_then_logout() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryCredentialStore::new());
        let client = client(&server, store.clone());

        client.store_credentials(&Credentials::new("A1", "R1")).unwrap();
        client.set_locale("es").unwrap();
        assert_eq!(store.get("refresh_token").unwrap().as_deref(), Some("R1"));

        client.logout();
        assert!(store.is_empty());
    }

    #[tokio::test]
    #[ignore = "needs a platform keychain service"]
    async fn default_store_keeps_credentials_between_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/languages/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let mut config = Config::default();
        config.api.base_url = server.uri();
        config.credentials.service_name = "Lingua.client-test".into();
        let client = ApiClient::builder().config(config).build().unwrap();

        client.store_credentials(&Credentials::new("A1", "R1")).unwrap();
        let value = client.read("/languages/", &Query::new(), ReadOptions::default()).await;
        client.logout();

        assert_eq!(value.unwrap(), json!([]));
    }
}
