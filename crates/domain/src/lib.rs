//! # Lingua Domain
//!
//! Domain types shared by the Lingua API access layer.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Wire DTOs (pagination envelope, credential pair, refresh exchange)
//! - Default constants
//!
//! ## Architecture
//! - No dependencies on other Lingua crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
