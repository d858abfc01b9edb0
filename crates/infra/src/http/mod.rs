//! Shared HTTP client

pub mod client;

pub use client::{ensure_success, HttpClient, HttpClientBuilder};
