use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use room_cell::RoomError;
use shared_database::DbError;
use shared_models::error::AppError;
use staff_cell::{StaffError, StaffKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }
}

/// Fixed working blocks a schedule is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Afternoon,
}

impl Shift {
    pub fn start_time(&self) -> NaiveTime {
        match self {
            Shift::Morning => hm(7, 0),
            Shift::Afternoon => hm(13, 0),
        }
    }

    pub fn end_time(&self) -> NaiveTime {
        match self {
            Shift::Morning => hm(11, 30),
            Shift::Afternoon => hm(16, 30),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub staff_type: StaffKind,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_id: Uuid,
    pub status: ScheduleStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A weekly pattern to expand into one row per matching day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub staff_id: Uuid,
    pub staff_type: StaffKind,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// 0 = Sunday through 6 = Saturday.
    #[serde(default)]
    pub weekdays: Vec<u8>,
    pub shift: Shift,
    pub notes: Option<String>,
}

/// One generated row before it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSlot {
    pub staff_id: Uuid,
    pub staff_type: StaffKind,
    pub room_id: Uuid,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub work_date: Option<NaiveDate>,
    /// Takes precedence over explicit times.
    pub shift: Option<Shift>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub room_id: Option<Uuid>,
    pub status: Option<ScheduleStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSearchQuery {
    pub staff_type: Option<StaffKind>,
    pub staff_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub status: Option<ScheduleStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictReason {
    Staff,
    Room,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub existing_id: Uuid,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: ConflictReason,
}

impl fmt::Display for ScheduleConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = match self.reason {
            ConflictReason::Staff => "staff member",
            ConflictReason::Room => "room",
        };
        write!(
            f,
            "{} {}-{} ({} already booked)",
            self.work_date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
            who
        )
    }
}

fn describe(conflicts: &[ScheduleConflict]) -> String {
    conflicts.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Schedule not found")]
    NotFound,

    #[error("{0} not found")]
    UnknownStaff(&'static str),

    #[error("{0} is inactive and cannot be scheduled")]
    InactiveStaff(&'static str),

    #[error("Room not found")]
    UnknownRoom,

    #[error("Room {0} is under maintenance")]
    RoomUnderMaintenance(String),

    #[error("Schedule conflicts with existing bookings: {}", describe(.0))]
    Conflicts(Vec<ScheduleConflict>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No {0} profile is linked to this account")]
    NoStaffProfile(&'static str),

    #[error("Failed to {0} schedule")]
    WriteFailed(&'static str),

    #[error(transparent)]
    Staff(#[from] StaffError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<RoomError> for ScheduleError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotFound => ScheduleError::UnknownRoom,
            RoomError::Database(e) => ScheduleError::Database(e),
            other => ScheduleError::Validation(other.to_string()),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::NotFound | ScheduleError::NoStaffProfile(_) => AppError::NotFound(err.to_string()),
            ScheduleError::UnknownStaff(_)
            | ScheduleError::InactiveStaff(_)
            | ScheduleError::UnknownRoom
            | ScheduleError::RoomUnderMaintenance(_)
            | ScheduleError::Validation(_) => AppError::ValidationError(err.to_string()),
            ScheduleError::Conflicts(_) => AppError::Conflict(err.to_string()),
            ScheduleError::WriteFailed(_) => AppError::Database(err.to_string()),
            ScheduleError::Staff(e) => e.into(),
            ScheduleError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_times() {
        assert_eq!(Shift::Morning.start_time().to_string(), "07:00:00");
        assert_eq!(Shift::Morning.end_time().to_string(), "11:30:00");
        assert_eq!(Shift::Afternoon.start_time().to_string(), "13:00:00");
        assert_eq!(Shift::Afternoon.end_time().to_string(), "16:30:00");
    }

    #[test]
    fn test_conflict_message() {
        let err = ScheduleError::Conflicts(vec![ScheduleConflict {
            existing_id: Uuid::nil(),
            work_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            start_time: Shift::Morning.start_time(),
            end_time: Shift::Morning.end_time(),
            reason: ConflictReason::Room,
        }]);
        assert_eq!(
            err.to_string(),
            "Schedule conflicts with existing bookings: 2024-01-03 07:00-11:30 (room already booked)"
        );
    }
}
