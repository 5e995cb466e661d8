use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;
use shared_utils::uploads::UploadError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub head_doctor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyDoctorUser {
    pub full_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyDoctor {
    pub id: Uuid,
    pub experience_years: Option<i32>,
    pub user: SpecialtyDoctorUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyServiceItem {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub service_type: String,
}

/// Specialty page: the department with its active doctors and offered services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyDetail {
    #[serde(flatten)]
    pub specialty: Specialty,
    pub doctors: Vec<SpecialtyDoctor>,
    pub services: Vec<SpecialtyServiceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpecialtyRequest {
    pub name: String,
    pub description: Option<String>,
    /// Base64 image, optionally as a data URI.
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSpecialtyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignHeadDoctorRequest {
    /// `null` clears the assignment.
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecialtySearchQuery {
    pub name: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Error, Debug)]
pub enum SpecialtyError {
    #[error("Specialty not found")]
    NotFound,

    #[error("Specialty '{0}' already exists")]
    DuplicateName(String),

    #[error("Cannot delete specialty: it is still referenced by {}", .0.join(", "))]
    InUse(Vec<&'static str>),

    #[error("Doctor {0} does not belong to this specialty")]
    HeadDoctorNotInSpecialty(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to {0} specialty")]
    WriteFailed(&'static str),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<SpecialtyError> for AppError {
    fn from(err: SpecialtyError) -> Self {
        match err {
            SpecialtyError::NotFound => AppError::NotFound(err.to_string()),
            SpecialtyError::DuplicateName(_) | SpecialtyError::InUse(_) => AppError::Conflict(err.to_string()),
            SpecialtyError::HeadDoctorNotInSpecialty(_) | SpecialtyError::Validation(_) => {
                AppError::ValidationError(err.to_string())
            }
            SpecialtyError::WriteFailed(_) => AppError::Database(err.to_string()),
            SpecialtyError::Upload(e) => e.into(),
            SpecialtyError::Database(e) => e.into(),
        }
    }
}
