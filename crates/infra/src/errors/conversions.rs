//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use reqwest::StatusCode;
use serde_json::Error as JsonError;
use stagesync_domain::StageSyncError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub StageSyncError);

impl From<InfraError> for StageSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<StageSyncError> for InfraError {
    fn from(value: StageSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoStageSyncError {
    fn into_stagesync(self) -> StageSyncError;
}

/* -------------------------------------------------------------------------- */
/* HTTP status → StageSyncError */
/* -------------------------------------------------------------------------- */

/// Map a non-success HTTP status (plus optional provider detail) to the
/// domain taxonomy.
pub fn status_to_error(status: StatusCode, detail: Option<&str>) -> StageSyncError {
    let code = status.as_u16();
    let mut message =
        format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    if let Some(detail) = detail.filter(|d| !d.trim().is_empty()) {
        message.push_str(": ");
        message.push_str(detail.trim());
    }

    match code {
        401 | 403 => StageSyncError::Auth(message),
        404 | 410 => StageSyncError::NotFound(message),
        429 => StageSyncError::Network(message),
        400..=499 => StageSyncError::InvalidInput(message),
        _ => StageSyncError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → StageSyncError */
/* -------------------------------------------------------------------------- */

impl IntoStageSyncError for HttpError {
    fn into_stagesync(self) -> StageSyncError {
        if self.is_timeout() {
            return StageSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return StageSyncError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_to_error(status, None);
        }

        if self.is_decode() {
            return StageSyncError::Provider(format!("malformed response body: {self}"));
        }

        StageSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_stagesync())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → StageSyncError */
/* -------------------------------------------------------------------------- */

impl IntoStageSyncError for JsonError {
    fn into_stagesync(self) -> StageSyncError {
        if self.is_io() {
            return StageSyncError::Internal(format!("JSON I/O error: {self}"));
        }
        StageSyncError::Provider(format!("unexpected JSON payload: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_stagesync())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → StageSyncError */
/* -------------------------------------------------------------------------- */

impl IntoStageSyncError for toml::de::Error {
    fn into_stagesync(self) -> StageSyncError {
        StageSyncError::Config(format!("invalid TOML: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_stagesync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
