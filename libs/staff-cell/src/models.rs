use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::uploads::UploadError;

/// Columns of `users` that may leave the service. `password_hash` is never selected.
pub const USER_COLUMNS: &str =
    "id,email,full_name,phone,gender,date_of_birth,address,role,status,avatar_url,created_at,updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaffKind {
    #[serde(rename = "doctor")]
    Doctor,
    #[serde(rename = "labtech")]
    LabTech,
}

impl StaffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffKind::Doctor => "doctor",
            StaffKind::LabTech => "labtech",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            StaffKind::Doctor => "doctors",
            StaffKind::LabTech => "lab_technicians",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            StaffKind::Doctor => Role::Doctor,
            StaffKind::LabTech => Role::LabTech,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StaffKind::Doctor => "Doctor",
            StaffKind::LabTech => "Lab technician",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub role: String,
    pub status: UserStatus,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffSpecialty {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialty_id: Option<Uuid>,
    pub license_number: Option<String>,
    pub experience_years: Option<i32>,
    pub education: Option<String>,
    pub biography: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTechnician {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialty_id: Option<Uuid>,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff row with its embedded account and specialty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffProfile<T> {
    #[serde(flatten)]
    pub staff: T,
    pub user: UserAccount,
    pub specialty: Option<StaffSpecialty>,
}

pub type DoctorProfile = StaffProfile<Doctor>;
pub type LabTechnicianProfile = StaffProfile<LabTechnician>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingSchedule {
    pub id: Uuid,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDetail {
    #[serde(flatten)]
    pub profile: DoctorProfile,
    pub upcoming_schedules: Vec<UpcomingSchedule>,
}

/// Account fields shared by doctor and lab technician creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    /// Base64 image, optionally as a data URI.
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    #[serde(flatten)]
    pub account: NewAccount,
    pub specialty_id: Uuid,
    pub license_number: Option<String>,
    pub experience_years: Option<i32>,
    pub education: Option<String>,
    pub biography: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    #[serde(flatten)]
    pub account: AccountChanges,
    pub specialty_id: Option<Uuid>,
    pub license_number: Option<String>,
    pub experience_years: Option<i32>,
    pub education: Option<String>,
    pub biography: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLabTechnicianRequest {
    #[serde(flatten)]
    pub account: NewAccount,
    pub specialty_id: Uuid,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLabTechnicianRequest {
    #[serde(flatten)]
    pub account: AccountChanges,
    pub specialty_id: Option<Uuid>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarUploadRequest {
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffSearchQuery {
    pub specialty_id: Option<Uuid>,
    pub status: Option<UserStatus>,
    /// Case-insensitive substring of the full name.
    pub name: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// What deleting a staff member actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeletionOutcome {
    Deleted,
    Deactivated { referenced_by: Vec<String> },
}

#[derive(Error, Debug)]
pub enum StaffError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Email {0} is already registered")]
    DuplicateEmail(String),

    #[error("Specialty {0} does not exist")]
    UnknownSpecialty(Uuid),

    #[error("Account is already active")]
    AlreadyActive,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to {0}")]
    WriteFailed(&'static str),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<StaffError> for AppError {
    fn from(err: StaffError) -> Self {
        match err {
            StaffError::NotFound(_) => AppError::NotFound(err.to_string()),
            StaffError::DuplicateEmail(_) | StaffError::AlreadyActive => AppError::Conflict(err.to_string()),
            StaffError::UnknownSpecialty(_) | StaffError::Validation(_) => {
                AppError::ValidationError(err.to_string())
            }
            StaffError::WriteFailed(_) => AppError::Database(err.to_string()),
            StaffError::PasswordHash(_) => AppError::Internal(err.to_string()),
            StaffError::Upload(e) => e.into(),
            StaffError::Database(e) => e.into(),
        }
    }
}
