//! # StageSync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Google Calendar REST client and client factory
//! - OAuth credential provider with token refresh
//! - HTTP client with retry and backoff
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `stagesync-core`
//! - Contains all "impure" code (network, environment, files)

pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use auth::{MemoryTokenStore, OAuthCredentialProvider, TokenStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::{GoogleCalendarClient, GoogleCalendarFactory};
pub use observability::init_tracing;
