//! Follow-up encounter model

use chrono::NaiveDate;

/// Date format of discharge and status dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Structural check for a `YYYY-MM-DD` date string
///
/// Only the shape is checked (length and hyphen positions); calendar validity
/// is left to [`parse_date`].
#[must_use]
pub fn is_structurally_valid_date(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() > 7 && bytes[4] == b'-' && bytes[7] == b'-'
}

/// Parse a `YYYY-MM-DD` date
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// A hospitalization reported at follow-up, linked to its patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    /// Hospitalization code as reported (always the configured "yes" code)
    pub hospitalization_code: String,
    /// Follow-up status date (`YYYY-MM-DD`)
    pub status_date: String,
    /// Days from each of the patient's discharge dates to the status date
    ///
    /// Filled by the readmission classifier, one entry per discharge date
    /// whose pair parsed.
    pub days_since_discharge: Vec<i64>,
}

impl FollowUp {
    /// Create a follow-up with no computed deltas yet
    #[must_use]
    pub fn new(hospitalization_code: impl Into<String>, status_date: impl Into<String>) -> Self {
        Self {
            hospitalization_code: hospitalization_code.into(),
            status_date: status_date.into(),
            days_since_discharge: Vec::new(),
        }
    }

    /// Parsed status date
    #[must_use]
    pub fn status(&self) -> Option<NaiveDate> {
        parse_date(&self.status_date)
    }
}
