use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Examination,
    Laboratory,
    Operating,
    Ward,
    Emergency,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Examination => "examination",
            RoomType::Laboratory => "laboratory",
            RoomType::Operating => "operating",
            RoomType::Ward => "ward",
            RoomType::Emergency => "emergency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub room_number: String,
    pub room_type: RoomType,
    pub capacity: i32,
    pub status: RoomStatus,
    pub specialty_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub room_number: String,
    pub room_type: RoomType,
    pub capacity: i32,
    pub status: Option<RoomStatus>,
    pub specialty_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRoomRequest {
    pub room_number: Option<String>,
    pub room_type: Option<RoomType>,
    pub capacity: Option<i32>,
    pub status: Option<RoomStatus>,
    pub specialty_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoomStatusRequest {
    pub status: RoomStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomSearchQuery {
    pub room_type: Option<RoomType>,
    pub status: Option<RoomStatus>,
    pub specialty_id: Option<Uuid>,
    /// Substring of the room number.
    pub name: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableRoomsQuery {
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_type: Option<RoomType>,
}

/// Only the columns needed to decide whether a room is taken.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomBooking {
    pub room_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,

    #[error("Room number {0} already exists")]
    DuplicateNumber(String),

    #[error("Cannot delete room: it is still referenced by {}", .0.join(", "))]
    InUse(Vec<&'static str>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to {0} room")]
    WriteFailed(&'static str),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<RoomError> for AppError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotFound => AppError::NotFound(err.to_string()),
            RoomError::DuplicateNumber(_) | RoomError::InUse(_) => AppError::Conflict(err.to_string()),
            RoomError::Validation(_) => AppError::ValidationError(err.to_string()),
            RoomError::WriteFailed(_) => AppError::Database(err.to_string()),
            RoomError::Database(e) => e.into(),
        }
    }
}
