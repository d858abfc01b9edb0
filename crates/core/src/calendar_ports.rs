//! Calendar integration port interfaces
//!
//! The sync engine talks to external calendars only through these traits.
//! A [`CalendarClient`] is always scoped to one account's credentials; the
//! [`CalendarClientFactory`] produces one per resolved token.

use std::sync::Arc;

use async_trait::async_trait;
use stagesync_domain::{
    AccessToken, CalendarAccess, EventPatch, ExternalEvent, Result, TimeWindow,
};

/// Operations against one external calendar
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Create an event and return the id assigned by the provider
    async fn create_event(&self, event: &ExternalEvent) -> Result<String>;

    /// Apply the supplied fields, preserving everything else on the remote
    /// event
    async fn update_event(&self, event_id: &str, patch: &EventPatch) -> Result<()>;

    /// Delete an event
    async fn delete_event(&self, event_id: &str) -> Result<()>;

    /// Fetch a single event
    async fn get_event(&self, event_id: &str) -> Result<ExternalEvent>;

    /// List events starting inside `window`, ordered by start time
    async fn list_events(&self, window: &TimeWindow, max_results: usize)
        -> Result<Vec<ExternalEvent>>;

    /// Probe the calendar and report its identity
    async fn check_access(&self) -> Result<CalendarAccess>;
}

/// Builds calendar clients bound to an access token
pub trait CalendarClientFactory: Send + Sync {
    fn client_for(&self, token: &AccessToken) -> Arc<dyn CalendarClient>;
}

/// Resolves calendar credentials for an account
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a usable token, refreshing an expired one first.
    ///
    /// `Ok(None)` means the account is not connected or the refresh failed.
    async fn get_valid_token(&self, user_id: &str) -> Result<Option<AccessToken>>;

    /// Whether the account has calendar credentials stored at all
    async fn is_connected(&self, user_id: &str) -> Result<bool>;
}
