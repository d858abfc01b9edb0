//! Calendar, credential and clock fakes

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use stagesync_core::{CalendarClient, CalendarClientFactory, Clock, CredentialProvider};
use stagesync_domain::{
    AccessToken, CalendarAccess, EventPatch, ExternalEvent, Result as DomainResult,
    StageSyncError, TimeWindow,
};

/// Provider call as observed by a mock calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCall {
    Create,
    Update(String),
    Delete(String),
    List,
    CheckAccess,
}

#[derive(Default)]
struct CalendarState {
    events: BTreeMap<String, ExternalEvent>,
    calls: Vec<CalendarCall>,
    patches: Vec<EventPatch>,
    next_id: usize,
    failure: Option<StageSyncError>,
}

/// In-memory calendar for one account.
///
/// Ids are `{owner}-evt-{n}`. `fail_with` makes every call return the given
/// error until cleared.
#[derive(Clone)]
pub struct MockCalendarClient {
    owner: String,
    state: Arc<Mutex<CalendarState>>,
}

impl MockCalendarClient {
    pub fn new(owner: &str) -> Self {
        Self { owner: owner.to_string(), state: Arc::default() }
    }

    pub fn fail_with(&self, error: StageSyncError) {
        self.state.lock().unwrap().failure = Some(error);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().failure = None;
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn patches(&self) -> Vec<EventPatch> {
        self.state.lock().unwrap().patches.clone()
    }

    pub fn events(&self) -> Vec<ExternalEvent> {
        self.state.lock().unwrap().events.values().cloned().collect()
    }

    /// Seed an event that exists independently of any booking.
    pub fn seed(&self, event: ExternalEvent) {
        let id = event.id.clone().unwrap();
        self.state.lock().unwrap().events.insert(id, event);
    }

    fn record(&self, call: CalendarCall) -> DomainResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match &state.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CalendarClient for MockCalendarClient {
    async fn create_event(&self, event: &ExternalEvent) -> DomainResult<String> {
        self.record(CalendarCall::Create)?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("{}-evt-{}", self.owner, state.next_id);
        let mut stored = event.clone();
        stored.id = Some(id.clone());
        state.events.insert(id.clone(), stored);
        Ok(id)
    }

    async fn update_event(&self, event_id: &str, patch: &EventPatch) -> DomainResult<()> {
        self.record(CalendarCall::Update(event_id.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.patches.push(patch.clone());
        let existing = state
            .events
            .get(event_id)
            .cloned()
            .ok_or_else(|| StageSyncError::NotFound(format!("event {event_id}")))?;
        state.events.insert(event_id.to_string(), patch.apply_to(&existing));
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> DomainResult<()> {
        self.record(CalendarCall::Delete(event_id.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .events
            .remove(event_id)
            .map(|_| ())
            .ok_or_else(|| StageSyncError::NotFound(format!("event {event_id}")))
    }

    async fn get_event(&self, event_id: &str) -> DomainResult<ExternalEvent> {
        self.state
            .lock()
            .unwrap()
            .events
            .get(event_id)
            .cloned()
            .ok_or_else(|| StageSyncError::NotFound(format!("event {event_id}")))
    }

    async fn list_events(
        &self,
        window: &TimeWindow,
        max_results: usize,
    ) -> DomainResult<Vec<ExternalEvent>> {
        self.record(CalendarCall::List)?;
        let mut events: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .events
            .values()
            .filter(|event| event.end.instant > window.start && event.start.instant < window.end)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.start.instant);
        events.truncate(max_results);
        Ok(events)
    }

    async fn check_access(&self) -> DomainResult<CalendarAccess> {
        self.record(CalendarCall::CheckAccess)?;
        Ok(CalendarAccess {
            calendar_id: "primary".into(),
            display_name: format!("{} calendar", self.owner),
            time_zone: "America/Sao_Paulo".into(),
        })
    }
}

/// Factory handing out one persistent calendar per access token.
#[derive(Default, Clone)]
pub struct MockCalendars {
    calendars: Arc<Mutex<HashMap<String, MockCalendarClient>>>,
}

impl MockCalendars {
    pub fn calendar_for(&self, access_token: &str) -> MockCalendarClient {
        self.calendars
            .lock()
            .unwrap()
            .entry(access_token.to_string())
            .or_insert_with(|| MockCalendarClient::new(access_token.trim_start_matches("token-")))
            .clone()
    }
}

impl CalendarClientFactory for MockCalendars {
    fn client_for(&self, token: &AccessToken) -> Arc<dyn CalendarClient> {
        Arc::new(self.calendar_for(&token.access_token))
    }
}

/// Credential provider backed by a user → token map.
///
/// Users absent from the map are not connected; users in `broken` make the
/// lookup itself fail.
#[derive(Default, Clone)]
pub struct MockCredentials {
    tokens: Arc<Mutex<HashMap<String, AccessToken>>>,
    broken: Arc<Mutex<Vec<String>>>,
}

impl MockCredentials {
    /// Store a valid token `token-{user_id}` for the user.
    pub fn connect(&self, user_id: &str) -> AccessToken {
        let token = AccessToken {
            access_token: format!("token-{user_id}"),
            refresh_token: None,
            expires_at: Some(super::now() + Duration::hours(1)),
        };
        self.tokens.lock().unwrap().insert(user_id.to_string(), token.clone());
        token
    }

    pub fn disconnect(&self, user_id: &str) {
        self.tokens.lock().unwrap().remove(user_id);
    }

    pub fn break_lookup(&self, user_id: &str) {
        self.broken.lock().unwrap().push(user_id.to_string());
    }
}

#[async_trait]
impl CredentialProvider for MockCredentials {
    async fn get_valid_token(&self, user_id: &str) -> DomainResult<Option<AccessToken>> {
        if self.broken.lock().unwrap().iter().any(|u| u == user_id) {
            return Err(StageSyncError::Database("token store offline".into()));
        }
        Ok(self.tokens.lock().unwrap().get(user_id).cloned())
    }

    async fn is_connected(&self, user_id: &str) -> DomainResult<bool> {
        Ok(self.tokens.lock().unwrap().contains_key(user_id))
    }
}

/// Clock frozen at a given instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
