use std::sync::{Arc, Once};

use lingua_common::{CredentialStore, MemoryCredentialStore, MockClock};
use lingua_domain::Config;
use lingua_infra::api::{ApiClient, Navigator};
use parking_lot::Mutex;
use wiremock::MockServer;

pub const REFRESH_PATH: &str = "/auth/token/refresh/";

/// Navigator that records redirects instead of performing them.
pub struct RecordingNavigator {
    location: String,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(location: &str) -> Self {
        Self { location: location.to_string(), redirects: Mutex::new(Vec::new()) }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> String {
        self.location.clone()
    }

    fn redirect(&self, location: &str) {
        self.redirects.lock().push(location.to_string());
    }
}

/// Client wired to a mock server, an in-memory store and a mock clock.
pub struct TestApi {
    pub server: MockServer,
    pub store: Arc<MemoryCredentialStore>,
    pub clock: MockClock,
    pub navigator: Arc<RecordingNavigator>,
    pub client: ApiClient,
}

impl TestApi {
    /// Signed-in session holding access token `A1` and refresh token `R1`.
    pub async fn signed_in() -> Self {
        Self::with_entries([("access_token", "A1"), ("refresh_token", "R1")]).await
    }

    pub async fn anonymous() -> Self {
        Self::with_entries(Vec::<(&str, &str)>::new()).await
    }

    pub async fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        init_tracing();

        let server = MockServer::start().await;
        let store = Arc::new(MemoryCredentialStore::with_entries(entries));
        let clock = MockClock::new();
        let navigator = Arc::new(RecordingNavigator::at("/lessons/7/"));

        let mut config = Config::default();
        config.api.base_url = server.uri();
        config.api.refresh_path = REFRESH_PATH.to_string();

        let client = ApiClient::builder()
            .config(config)
            .store(store.clone())
            .clock(Arc::new(clock.clone()))
            .navigator(navigator.clone())
            .build()
            .expect("client should build");

        Self { server, store, clock, navigator, client }
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).expect("memory store never fails")
    }

    /// Requests the server received for `path`.
    pub async fn hits(&self, path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == path)
            .count()
    }
}

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
