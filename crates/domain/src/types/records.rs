//! Syncable record types
//!
//! A [`ShiftRecord`] is the syncable aggregate: one inspector shift with its
//! nested watercraft inspections. Records are created locally, finalized by
//! the user, and later reconciled with the remote authority by the sync
//! coordinator. The remote side is the single authority; the device is the
//! single writer ("device wins, retry until accepted").

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::WIRE_DATE_FORMAT;
use crate::errors::FieldSyncError;

/// Lifecycle status of a syncable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Created locally, still being edited
    Draft,
    /// Finalized by the user, waiting for a sync pass
    PendingSync,
    /// Accepted by the remote authority
    Completed,
    /// Last submission attempt failed; still eligible for the next pass
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "Draft",
            Self::PendingSync => "PendingSync",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

impl FromStr for RecordStatus {
    type Err = FieldSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "PendingSync" => Ok(Self::PendingSync),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            other => {
                Err(FieldSyncError::InvalidInput(format!("unknown record status: {other}")))
            }
        }
    }
}

/// Weather observed during a shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub sunny: bool,
    pub cloudy: bool,
    pub raining: bool,
    pub snowing: bool,
    pub foggy: bool,
    pub windy: bool,
}

/// A watercraft inspection nested under a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub local_id: Uuid,
    /// Assigned by the remote authority after a successful submission
    pub remote_id: Option<i64>,
    pub inspection_time: DateTime<Utc>,
    pub watercraft_type: String,
    pub province_of_origin: String,
    pub high_risk: bool,
    pub adult_mussels_found: bool,
    pub comments: String,
}

impl InspectionRecord {
    pub fn new(watercraft_type: impl Into<String>, province_of_origin: impl Into<String>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            remote_id: None,
            inspection_time: Utc::now(),
            watercraft_type: watercraft_type.into(),
            province_of_origin: province_of_origin.into(),
            high_risk: false,
            adult_mussels_found: false,
            comments: String::new(),
        }
    }
}

/// One inspector shift, the unit of synchronization.
///
/// Invariants maintained by the store and coordinator:
/// - `status == Completed` implies `!should_sync` and `remote_id.is_some()`
/// - a record is eligible for a sync pass iff `should_sync`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    /// Stable local identifier, assigned at creation, never reused
    pub local_id: Uuid,
    /// Assigned by the remote authority after the first successful submission
    pub remote_id: Option<i64>,
    /// True while unconfirmed local changes exist
    pub should_sync: bool,
    pub status: RecordStatus,
    pub user_id: String,
    pub date: NaiveDate,
    pub station: String,
    pub start_time: String,
    pub end_time: String,
    pub boats_inspected: bool,
    pub motorized_blow_bys: i32,
    pub non_motorized_blow_bys: i32,
    pub k9_on_shift: bool,
    pub weather: WeatherConditions,
    pub shift_start_comments: String,
    pub shift_end_comments: String,
    pub inspections: Vec<InspectionRecord>,
    pub created_at: DateTime<Utc>,
}

impl ShiftRecord {
    /// Create a new draft shift. Drafts are not eligible for sync until
    /// [`finalize`](Self::finalize) is called.
    pub fn new(user_id: impl Into<String>, date: NaiveDate, station: impl Into<String>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            remote_id: None,
            should_sync: false,
            status: RecordStatus::Draft,
            user_id: user_id.into(),
            date,
            station: station.into(),
            start_time: String::new(),
            end_time: String::new(),
            boats_inspected: false,
            motorized_blow_bys: 0,
            non_motorized_blow_bys: 0,
            k9_on_shift: false,
            weather: WeatherConditions::default(),
            shift_start_comments: String::new(),
            shift_end_comments: String::new(),
            inspections: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Mark the record as ready for synchronization.
    pub fn finalize(&mut self) {
        self.should_sync = true;
        self.status = RecordStatus::PendingSync;
    }

    /// Whether this record should be picked up by the next sync pass.
    pub fn is_eligible(&self) -> bool {
        self.should_sync
    }

    /// Build the wire payload for remote submission.
    pub fn payload(&self) -> ShiftPayload {
        ShiftPayload {
            date: self.date.format(WIRE_DATE_FORMAT).to_string(),
            station: self.station.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            boats_inspected: self.boats_inspected,
            motorized_blow_bys: self.motorized_blow_bys,
            non_motorized_blow_bys: self.non_motorized_blow_bys,
            k9_on_shift: self.k9_on_shift,
            sunny: self.weather.sunny,
            cloudy: self.weather.cloudy,
            raining: self.weather.raining,
            snowing: self.weather.snowing,
            foggy: self.weather.foggy,
            windy: self.weather.windy,
            shift_start_comments: self.shift_start_comments.clone(),
            shift_end_comments: self.shift_end_comments.clone(),
        }
    }
}

/// Wire payload for a shift submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftPayload {
    pub date: String,
    pub station: String,
    pub start_time: String,
    pub end_time: String,
    pub boats_inspected: bool,
    pub motorized_blow_bys: i32,
    pub non_motorized_blow_bys: i32,
    pub k9_on_shift: bool,
    pub sunny: bool,
    pub cloudy: bool,
    pub raining: bool,
    pub snowing: bool,
    pub foggy: bool,
    pub windy: bool,
    pub shift_start_comments: String,
    pub shift_end_comments: String,
}

/// Wire payload for a nested inspection submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionPayload {
    pub inspection_time: DateTime<Utc>,
    pub watercraft_type: String,
    pub province_of_origin: String,
    pub high_risk: bool,
    pub adult_mussels_found: bool,
    pub comments: String,
}

impl From<&InspectionRecord> for InspectionPayload {
    fn from(record: &InspectionRecord) -> Self {
        Self {
            inspection_time: record.inspection_time,
            watercraft_type: record.watercraft_type.clone(),
            province_of_origin: record.province_of_origin.clone(),
            high_risk: record.high_risk,
            adult_mussels_found: record.adult_mussels_found,
            comments: record.comments.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shift() -> ShiftRecord {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        ShiftRecord::new("user-1", date, "Golden")
    }

    #[test]
    fn new_shift_is_draft_and_not_eligible() {
        let shift = sample_shift();
        assert_eq!(shift.status, RecordStatus::Draft);
        assert!(!shift.should_sync);
        assert!(!shift.is_eligible());
        assert!(shift.remote_id.is_none());
    }

    #[test]
    fn finalize_makes_record_eligible() {
        let mut shift = sample_shift();
        shift.finalize();
        assert_eq!(shift.status, RecordStatus::PendingSync);
        assert!(shift.is_eligible());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            RecordStatus::Draft,
            RecordStatus::PendingSync,
            RecordStatus::Completed,
            RecordStatus::Failed,
        ] {
            let parsed: RecordStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("Bogus".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn payload_formats_wire_date() {
        let shift = sample_shift();
        let payload = shift.payload();
        assert_eq!(payload.date, "2024-06-15");
        assert_eq!(payload.station, "Golden");
    }
}
