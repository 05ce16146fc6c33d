//! # Lingua Infrastructure
//!
//! Access layer between the Lingua front end and its REST API.
//!
//! This crate contains:
//! - The API client: cached and coalesced reads, credential decoration,
//!   single-flight token refresh and session expiry
//! - Typed resource and scope facades over the client
//! - HTTP transport (reqwest)
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Depends on `lingua-domain` for configuration and wire types
//! - Depends on `lingua-common` for the credential store and clock
//! - Contains all I/O

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, ApiError, Catalog, Query, ReadOptions};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
