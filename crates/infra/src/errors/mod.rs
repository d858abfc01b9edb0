//! Infrastructure error handling

pub mod conversions;

pub use conversions::{status_to_error, InfraError};
