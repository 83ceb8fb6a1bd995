//! Core domain and wire types for PileLog.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Display format for driving dates shown to operators (`DD.MM.YYYY`).
pub const DATE_FORMAT: &str = "%d.%m.%Y";

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Stable conversation key supplied by the messaging transport (a chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// PendingRecord
// ---------------------------------------------------------------------------

/// A pile-driving event under construction.
///
/// Fields are filled strictly in dialogue order; `None` means the step that
/// owns the field has not completed yet (or was skipped, for optional text).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingRecord {
    pub project_id: i64,
    pub pile_number: Option<String>,
    pub pile_field_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    /// Measured pile head elevation, millimetres.
    pub fact_pile_head: Option<i64>,
    pub recorded_by: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// PileDrivingRecord
// ---------------------------------------------------------------------------

/// A completed record in the backend's JSON schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PileDrivingRecord {
    pub project_id: i64,
    pub pile_number: String,
    /// `0` when the deployment has no pile field.
    pub pile_field_id: i64,
    /// Driving date at 00:00:00 UTC.
    pub start_date: DateTime<Utc>,
    /// Measured pile head elevation, millimetres.
    pub fact_pile_head: i64,
    /// Empty when the operator skipped the step.
    pub recorded_by: String,
    /// Collected by the dialogue but not part of the backend schema.
    #[serde(skip)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// SubmissionResult
// ---------------------------------------------------------------------------

/// Outcome of posting a record to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub success: bool,
    /// Status line (e.g. `500 Internal Server Error`) or transport error text.
    pub server_message: String,
}

impl SubmissionResult {
    pub fn accepted(server_message: impl Into<String>) -> Self {
        Self {
            success: true,
            server_message: server_message.into(),
        }
    }

    pub fn rejected(server_message: impl Into<String>) -> Self {
        Self {
            success: false,
            server_message: server_message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Date helpers
// ---------------------------------------------------------------------------

/// The calendar date at midnight, expressed in UTC.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Render a date as `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
