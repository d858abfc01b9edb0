//! Google Calendar REST client
//!
//! Implements [`CalendarClient`] against the Calendar v3 API. Each client is
//! bound to one bearer token; [`GoogleCalendarFactory`] builds them from the
//! shared HTTP stack.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use stagesync_core::{CalendarClient, CalendarClientFactory};
use stagesync_domain::{
    AccessToken, CalendarAccess, CalendarSettings, EventPatch, ExternalEvent, Result,
    StageSyncError, TimeWindow,
};
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    convert_listed, GoogleCalendarListEntry, GoogleEvent, GoogleEventList, GoogleEventPatch,
};
use crate::http::{ensure_success, HttpClient};

/// Calendar v3 client scoped to one account
pub struct GoogleCalendarClient {
    http: HttpClient,
    base_url: Url,
    calendar_id: String,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Client for `calendar_id` under `base_url`, authorized with `access_token`.
    ///
    /// # Errors
    /// Returns `StageSyncError::Config` if `base_url` is not a usable base URL.
    pub fn new(
        http: HttpClient,
        base_url: &str,
        calendar_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StageSyncError::Config(format!("invalid calendar API URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StageSyncError::Config(format!(
                "calendar API URL cannot be a base: {base_url}"
            )));
        }
        Ok(Self {
            http,
            base_url,
            calendar_id: calendar_id.into(),
            access_token: access_token.into(),
        })
    }

    /// `{base}/{segments...}` with every segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StageSyncError::Internal("calendar API URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn events_url(&self) -> Result<Url> {
        self.endpoint(&["calendars", &self.calendar_id, "events"])
    }

    fn event_url(&self, event_id: &str) -> Result<Url> {
        self.endpoint(&["calendars", &self.calendar_id, "events", event_id])
    }

    fn authorized(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.access_token)
    }

    async fn fetch_raw(&self, event_id: &str) -> Result<GoogleEvent> {
        let url = self.event_url(event_id)?;
        self.http.send_json(self.authorized(Method::GET, url)).await
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    #[instrument(skip(self, event), fields(calendar_id = %self.calendar_id))]
    async fn create_event(&self, event: &ExternalEvent) -> Result<String> {
        let url = self.events_url()?;
        let body = GoogleEvent::from(event);
        let created: GoogleEvent =
            self.http.send_json(self.authorized(Method::POST, url).json(&body)).await?;

        let id = created
            .id
            .ok_or_else(|| StageSyncError::Provider("created event has no id".into()))?;
        debug!(event_id = %id, "calendar event created");
        Ok(id)
    }

    #[instrument(skip(self, patch), fields(calendar_id = %self.calendar_id))]
    async fn update_event(&self, event_id: &str, patch: &EventPatch) -> Result<()> {
        // events.patch merges server-side; fields absent from the body are kept.
        let url = self.event_url(event_id)?;
        let body = GoogleEventPatch::from(patch);
        ensure_success(self.http.send(self.authorized(Method::PATCH, url).json(&body)).await?)
            .await?;
        debug!(event_id, "calendar event updated");
        Ok(())
    }

    #[instrument(skip(self), fields(calendar_id = %self.calendar_id))]
    async fn delete_event(&self, event_id: &str) -> Result<()> {
        let url = self.event_url(event_id)?;
        ensure_success(self.http.send(self.authorized(Method::DELETE, url)).await?).await?;
        debug!(event_id, "calendar event deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(calendar_id = %self.calendar_id))]
    async fn get_event(&self, event_id: &str) -> Result<ExternalEvent> {
        ExternalEvent::try_from(self.fetch_raw(event_id).await?)
    }

    #[instrument(skip(self), fields(calendar_id = %self.calendar_id))]
    async fn list_events(
        &self,
        window: &TimeWindow,
        max_results: usize,
    ) -> Result<Vec<ExternalEvent>> {
        let url = self.events_url()?;
        let query = [
            ("timeMin", window.start.to_rfc3339()),
            ("timeMax", window.end.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", max_results.max(1).to_string()),
        ];

        let page: GoogleEventList =
            self.http.send_json(self.authorized(Method::GET, url).query(&query)).await?;
        if page.next_page_token.is_some() {
            debug!(max_results, "event listing truncated to the first page");
        }
        Ok(convert_listed(page.items))
    }

    #[instrument(skip(self), fields(calendar_id = %self.calendar_id))]
    async fn check_access(&self) -> Result<CalendarAccess> {
        let url = self.endpoint(&["users", "me", "calendarList", &self.calendar_id])?;
        let entry: GoogleCalendarListEntry =
            self.http.send_json(self.authorized(Method::GET, url)).await?;
        Ok(entry.into())
    }
}

/// Builds [`GoogleCalendarClient`]s that share one connection pool
#[derive(Clone)]
pub struct GoogleCalendarFactory {
    http: HttpClient,
    base_url: String,
    calendar_id: String,
}

impl GoogleCalendarFactory {
    /// Factory sharing `http` across every client it builds.
    pub fn new(http: HttpClient, base_url: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into(), calendar_id: calendar_id.into() }
    }

    /// Factory with an HTTP client built from calendar settings.
    pub fn from_settings(settings: &CalendarSettings) -> Result<Self> {
        Url::parse(&settings.api_base_url)
            .map_err(|e| StageSyncError::Config(format!("invalid calendar API URL: {e}")))?;
        let http = HttpClient::from_settings(settings)?;
        Ok(Self::new(http, settings.api_base_url.clone(), settings.calendar_id.clone()))
    }
}

impl CalendarClientFactory for GoogleCalendarFactory {
    fn client_for(&self, token: &AccessToken) -> Arc<dyn CalendarClient> {
        match GoogleCalendarClient::new(
            self.http.clone(),
            &self.base_url,
            self.calendar_id.clone(),
            token.access_token.clone(),
        ) {
            Ok(client) => Arc::new(client),
            Err(err) => Arc::new(UnavailableCalendar(err)),
        }
    }
}

/// Stand-in returned when the client cannot be built; every call fails with
/// the construction error.
struct UnavailableCalendar(StageSyncError);

#[async_trait]
impl CalendarClient for UnavailableCalendar {
    async fn create_event(&self, _event: &ExternalEvent) -> Result<String> {
        Err(self.0.clone())
    }

    async fn update_event(&self, _event_id: &str, _patch: &EventPatch) -> Result<()> {
        Err(self.0.clone())
    }

    async fn delete_event(&self, _event_id: &str) -> Result<()> {
        Err(self.0.clone())
    }

    async fn get_event(&self, _event_id: &str) -> Result<ExternalEvent> {
        Err(self.0.clone())
    }

    async fn list_events(&self, _window: &TimeWindow, _max: usize) -> Result<Vec<ExternalEvent>> {
        Err(self.0.clone())
    }

    async fn check_access(&self) -> Result<CalendarAccess> {
        Err(self.0.clone())
    }
}
