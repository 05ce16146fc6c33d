//! Wire types exchanged with the remote API

pub mod auth;
pub mod listing;

pub use auth::{Credentials, RefreshRequest, RefreshResponse};
pub use listing::{Listing, Page};
