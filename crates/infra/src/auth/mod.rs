//! Calendar account credentials

mod provider;
mod token_store;

pub use provider::OAuthCredentialProvider;
pub use token_store::{MemoryTokenStore, TokenStore};
