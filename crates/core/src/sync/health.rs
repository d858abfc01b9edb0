//! Calendar integration health verdict for one user
//!
//! Every check runs regardless of the others. A check that cannot gather its
//! input counts as failed; it never fails the whole report.

use std::sync::Arc;

use chrono::Duration;
use stagesync_domain::{
    CalendarAccess, ConflictReport, HealthDetails, HealthReport, Result, SyncSettings, SyncStats,
};
use tracing::{info, instrument, warn};

use super::conflicts::ConflictDetector;
use super::stats::StatisticsAggregator;
use crate::calendar_ports::{CalendarClientFactory, CredentialProvider};
use crate::clock::{Clock, SystemClock};

/// Runs the per-user health checks
pub struct HealthMonitor {
    credentials: Arc<dyn CredentialProvider>,
    clients: Arc<dyn CalendarClientFactory>,
    conflicts: Arc<ConflictDetector>,
    stats: Arc<StatisticsAggregator>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
    coverage_threshold: u8,
}

impl HealthMonitor {
    /// Create a monitor with the system clock and default settings
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        clients: Arc<dyn CalendarClientFactory>,
        conflicts: Arc<ConflictDetector>,
        stats: Arc<StatisticsAggregator>,
    ) -> Self {
        let settings = SyncSettings::default();
        Self {
            credentials,
            clients,
            conflicts,
            stats,
            clock: Arc::new(SystemClock),
            stale_after: Duration::days(settings.stale_after_days),
            coverage_threshold: settings.coverage_threshold_percent,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply staleness and coverage limits from settings.
    pub fn with_settings(mut self, settings: &SyncSettings) -> Self {
        self.stale_after = Duration::days(settings.stale_after_days);
        self.coverage_threshold = settings.coverage_threshold_percent;
        self
    }

    /// Run every check for `user_id`; failures become unhealthy checks.
    #[instrument(skip(self))]
    pub async fn check_health(&self, user_id: &str) -> HealthReport {
        let (access, conflicts, stats) = futures::join!(
            self.probe_calendar(user_id),
            self.conflicts.check(user_id, None),
            self.stats.stats(user_id),
        );

        let mut verdict = Verdict::default();
        let mut details = HealthDetails::default();

        match access {
            Probe::Reachable(calendar) => {
                details.credentials_valid = true;
                details.calendar_reachable = true;
                details.calendar = Some(calendar);
            }
            Probe::Unreachable(reason) => {
                details.credentials_valid = true;
                verdict.flag(
                    format!("Calendar is not reachable: {reason}"),
                    "Check that the calendar still grants access to this application",
                );
            }
            Probe::NoCredentials => {
                verdict.flag(
                    "Calendar credentials are missing or expired",
                    "Reconnect your calendar account",
                );
                verdict.flag(
                    "Calendar access could not be verified",
                    "Check calendar permissions after reconnecting",
                );
            }
        }

        self.check_recency(&stats, &mut verdict, &mut details);
        check_conflicts(conflicts, &mut verdict, &mut details);
        self.check_coverage(stats, &mut verdict, &mut details);

        let healthy = verdict.issues.is_empty();
        if healthy {
            info!("calendar integration healthy");
        } else {
            warn!(issues = verdict.issues.len(), "calendar integration unhealthy");
        }

        HealthReport {
            healthy,
            issues: verdict.issues,
            recommendations: verdict.recommendations,
            details,
        }
    }

    async fn probe_calendar(&self, user_id: &str) -> Probe {
        let token = match self.credentials.get_valid_token(user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => return Probe::NoCredentials,
            Err(err) => {
                warn!(error = %err, "credential lookup failed during health check");
                return Probe::NoCredentials;
            }
        };

        match self.clients.client_for(&token).check_access().await {
            Ok(calendar) => Probe::Reachable(calendar),
            Err(err) => Probe::Unreachable(err.to_string()),
        }
    }

    fn check_recency(
        &self,
        stats: &Result<SyncStats>,
        verdict: &mut Verdict,
        details: &mut HealthDetails,
    ) {
        let last_sync_at = match stats {
            Ok(stats) => stats.last_sync_at,
            Err(err) => {
                verdict.flag(
                    format!("Sync history unavailable: {err}"),
                    "Try again later or run a manual sync",
                );
                return;
            }
        };
        details.last_sync_at = last_sync_at;

        let fresh = last_sync_at.is_some_and(|at| self.clock.now() - at <= self.stale_after);
        if !fresh {
            let issue = match last_sync_at {
                Some(at) => format!("Last sync was on {}", at.format("%Y-%m-%d %H:%M UTC")),
                None => "Bookings have never been synchronized".to_string(),
            };
            verdict.flag(issue, "Run a manual sync");
        }
    }

    fn check_coverage(
        &self,
        stats: Result<SyncStats>,
        verdict: &mut Verdict,
        details: &mut HealthDetails,
    ) {
        let stats = match stats {
            Ok(stats) => stats,
            Err(err) => {
                verdict.flag(
                    format!("Sync coverage unavailable: {err}"),
                    "Run a full sync once the booking store is available",
                );
                return;
            }
        };

        if stats.total > 0 && stats.sync_percentage < self.coverage_threshold {
            verdict.flag(
                format!(
                    "Only {}% of upcoming bookings are synchronized ({} of {})",
                    stats.sync_percentage, stats.synced, stats.total
                ),
                "Run a full sync of all bookings",
            );
        }
        details.stats = Some(stats);
    }
}

fn check_conflicts(
    conflicts: Result<ConflictReport>,
    verdict: &mut Verdict,
    details: &mut HealthDetails,
) {
    match conflicts {
        Ok(report) => {
            let count = report.conflicts.len();
            details.conflict_count = Some(count);
            if report.has_conflicts {
                verdict.flag(
                    format!("{count} scheduling conflicts with existing calendar events"),
                    "Review the conflicting events and reschedule or decline them",
                );
            }
        }
        Err(err) => {
            verdict.flag(
                format!("Conflict check failed: {err}"),
                "Try the conflict check again later",
            );
        }
    }
}

enum Probe {
    Reachable(CalendarAccess),
    Unreachable(String),
    NoCredentials,
}

#[derive(Default)]
struct Verdict {
    issues: Vec<String>,
    recommendations: Vec<String>,
}

impl Verdict {
    fn flag(&mut self, issue: impl Into<String>, recommendation: impl Into<String>) {
        self.issues.push(issue.into());
        self.recommendations.push(recommendation.into());
    }
}
