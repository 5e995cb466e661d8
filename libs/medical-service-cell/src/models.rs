use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;
use shared_utils::uploads::UploadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Examination,
    Test,
    Procedure,
    Consultation,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Examination => "examination",
            ServiceType::Test => "test",
            ServiceType::Procedure => "procedure",
            ServiceType::Consultation => "consultation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub service_type: ServiceType,
    pub specialty_id: Option<Uuid>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpecialty {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub service: MedicalService,
    pub specialty: Option<ServiceSpecialty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub service_type: ServiceType,
    pub specialty_id: Option<Uuid>,
    /// Base64 image, optionally as a data URI.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub service_type: Option<ServiceType>,
    pub specialty_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSearchQuery {
    pub specialty_id: Option<Uuid>,
    pub service_type: Option<ServiceType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub name: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service not found")]
    NotFound,

    #[error("Service '{0}' already exists")]
    DuplicateName(String),

    #[error("Cannot delete service: it is still referenced by {}", .0.join(", "))]
    InUse(Vec<&'static str>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to {0} service")]
    WriteFailed(&'static str),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => AppError::NotFound(err.to_string()),
            ServiceError::DuplicateName(_) | ServiceError::InUse(_) => AppError::Conflict(err.to_string()),
            ServiceError::Validation(_) => AppError::ValidationError(err.to_string()),
            ServiceError::WriteFailed(_) => AppError::Database(err.to_string()),
            ServiceError::Upload(e) => e.into(),
            ServiceError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_use_message_lists_tables() {
        let err = ServiceError::InUse(vec!["appointments", "test results"]);
        assert_eq!(
            err.to_string(),
            "Cannot delete service: it is still referenced by appointments, test results"
        );
    }

    #[test]
    fn test_service_type_round_trips_lowercase() {
        let parsed: ServiceType = serde_json::from_str("\"consultation\"").unwrap();
        assert_eq!(parsed, ServiceType::Consultation);
        assert_eq!(parsed.as_str(), "consultation");
    }
}
