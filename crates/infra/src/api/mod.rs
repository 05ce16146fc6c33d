//! Client for the Lingua REST API
//!
//! Reads go through a TTL cache and are coalesced per request fingerprint.
//! Every request carries the stored access token and locale; a 401 triggers
//! one shared token refresh and a single retry, and a failed refresh ends the
//! session with a redirect to login. Any successful write clears the cache.
//!
//! # Module Organization
//!
//! - **[`client`]**: [`ApiClient`] and its builder, the request pipeline
//! - **[`reader`]**: cache plus in-flight registry behind one lock
//! - **[`refresh`]**: single-flight token refresh
//! - **[`facade`]** / **[`catalog`]**: typed per-resource access
//! - **[`dispatcher`]**: the HTTP seam

pub mod cache;
pub mod catalog;
pub mod client;
pub mod dispatcher;
pub mod errors;
pub mod facade;
pub mod fingerprint;
pub mod in_flight;
pub mod interceptor;
pub mod navigation;
pub mod reader;
pub mod refresh;
pub mod request;

pub use catalog::{Catalog, RESOURCES};
pub use client::{ApiClient, ApiClientBuilder};
pub use dispatcher::{Dispatcher, HttpDispatcher};
pub use errors::{ApiError, ApiErrorCategory};
pub use facade::{ResourceFacade, ScopeFacade};
pub use fingerprint::Fingerprint;
pub use interceptor::{CredentialKeys, OutgoingInterceptor};
pub use navigation::{LoginRedirect, Navigator, TracingNavigator};
pub use reader::CachedReader;
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
pub use request::{ApiRequest, ApiResponse, Query, ReadOptions};
