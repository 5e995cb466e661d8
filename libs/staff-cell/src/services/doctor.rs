use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{eq_filter, DependencyCheck, SupabaseClient};
use shared_models::auth::Role;
use shared_models::pagination::Page;

use crate::models::{
    CreateDoctorRequest, DeletionOutcome, Doctor, DoctorDetail, DoctorProfile, StaffError, StaffKind,
    StaffSearchQuery, UpcomingSchedule, UpdateDoctorRequest, UserAccount, UserStatus,
};
use crate::services::account::AccountService;

const KIND: StaffKind = StaffKind::Doctor;
const UPCOMING_LIMIT: usize = 20;

pub const DOCTOR_DEPENDENCIES: [DependencyCheck; 3] = [
    DependencyCheck::new("appointments", "doctor_id", "appointments"),
    DependencyCheck::new("schedules", "staff_id", "schedules").with_filter("staff_type=eq.doctor"),
    DependencyCheck::new("specialties", "head_doctor_id", "specialty head assignment"),
];

pub struct DoctorService {
    accounts: AccountService,
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            accounts: AccountService::new(config),
            supabase: SupabaseClient::new(config),
        }
    }

    /// Patients only ever see active doctors.
    pub async fn list_doctors(
        &self,
        query: StaffSearchQuery,
        active_only: bool,
        auth_token: Option<&str>,
    ) -> Result<Page<DoctorProfile>, StaffError> {
        self.accounts.list_staff(KIND, query, active_only, auth_token).await
    }

    pub async fn get_doctor(&self, doctor_id: Uuid, auth_token: Option<&str>) -> Result<DoctorProfile, StaffError> {
        self.accounts.get_staff(KIND, doctor_id, auth_token).await
    }

    pub async fn get_doctor_detail(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<DoctorDetail, StaffError> {
        debug!("Fetching doctor detail: {}", doctor_id);

        let schedules_query = format!(
            "select=id,work_date,start_time,end_time,room_id,status&{}&staff_type=eq.doctor&status=eq.scheduled&work_date=gte.{}&order=work_date.asc,start_time.asc&limit={}",
            eq_filter("staff_id", &doctor_id.to_string()),
            Utc::now().date_naive(),
            UPCOMING_LIMIT
        );

        let (profile, upcoming_schedules) = tokio::try_join!(
            self.get_doctor(doctor_id, auth_token),
            async {
                self.supabase
                    .select::<UpcomingSchedule>("schedules", &schedules_query, auth_token)
                    .await
                    .map_err(StaffError::from)
            },
        )?;

        if profile.user.status != UserStatus::Active {
            return Err(StaffError::NotFound(KIND.label()));
        }

        Ok(DoctorDetail { profile, upcoming_schedules })
    }

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        auth_token: &str,
    ) -> Result<DoctorProfile, StaffError> {
        if let Some(years) = request.experience_years {
            validate_experience(years)?;
        }
        self.accounts.ensure_specialty(request.specialty_id, auth_token).await?;

        let account = self.accounts.create_account(request.account, Role::Doctor, auth_token).await?;

        let now = Utc::now().to_rfc3339();
        let data = json!({
            "user_id": account.id,
            "specialty_id": request.specialty_id,
            "license_number": request.license_number,
            "experience_years": request.experience_years,
            "education": request.education,
            "biography": request.biography,
            "created_at": now,
            "updated_at": now
        });

        let doctor = match self.insert_doctor(data, auth_token).await {
            Ok(doctor) => doctor,
            Err(e) => {
                self.accounts.discard_account(&account, auth_token).await;
                return Err(e);
            }
        };

        info!("Created doctor {} for account {}", doctor.id, account.id);
        self.get_doctor(doctor.id, Some(auth_token)).await
    }

    async fn insert_doctor(&self, data: Value, auth_token: &str) -> Result<Doctor, StaffError> {
        let created: Vec<Doctor> = self.supabase.insert(KIND.table(), data, Some(auth_token)).await?;
        created.into_iter().next().ok_or(StaffError::WriteFailed("create doctor"))
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<DoctorProfile, StaffError> {
        let profile = self.get_doctor(doctor_id, Some(auth_token)).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(specialty_id) = request.specialty_id {
            self.accounts.ensure_specialty(specialty_id, auth_token).await?;
            update_data.insert("specialty_id".to_string(), json!(specialty_id));
        }
        if let Some(license_number) = request.license_number {
            update_data.insert("license_number".to_string(), json!(license_number));
        }
        if let Some(years) = request.experience_years {
            validate_experience(years)?;
            update_data.insert("experience_years".to_string(), json!(years));
        }
        if let Some(education) = request.education {
            update_data.insert("education".to_string(), json!(education));
        }
        if let Some(biography) = request.biography {
            update_data.insert("biography".to_string(), json!(biography));
        }

        let account_update = self.accounts
            .prepare_account_update(&profile.user, request.account, auth_token)
            .await?;
        self.accounts.apply_account_update(account_update, auth_token).await?;

        if !update_data.is_empty() {
            update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
            let filter = eq_filter("id", &doctor_id.to_string());
            let _: Vec<Value> = self.supabase
                .update(KIND.table(), &filter, Value::Object(update_data), Some(auth_token))
                .await?;
        }

        info!("Updated doctor {}", doctor_id);
        self.get_doctor(doctor_id, Some(auth_token)).await
    }

    pub async fn update_avatar(
        &self,
        doctor_id: Uuid,
        image: &str,
        auth_token: &str,
    ) -> Result<UserAccount, StaffError> {
        let profile = self.get_doctor(doctor_id, Some(auth_token)).await?;
        self.accounts.replace_avatar(&profile.user, image, auth_token).await
    }

    pub async fn reactivate_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<UserAccount, StaffError> {
        let profile = self.get_doctor(doctor_id, Some(auth_token)).await?;
        self.accounts.reactivate(&profile.user, auth_token).await
    }

    pub async fn delete_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<DeletionOutcome, StaffError> {
        let profile = self.get_doctor(doctor_id, Some(auth_token)).await?;
        self.accounts
            .retire_staff(KIND, doctor_id, &profile.user, &DOCTOR_DEPENDENCIES, auth_token)
            .await
    }
}

fn validate_experience(years: i32) -> Result<(), StaffError> {
    if !(0..=80).contains(&years) {
        return Err(StaffError::Validation("Experience years must be between 0 and 80".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_bounds() {
        assert!(validate_experience(0).is_ok());
        assert!(validate_experience(35).is_ok());
        assert!(validate_experience(-1).is_err());
        assert!(validate_experience(81).is_err());
    }

    #[test]
    fn test_schedule_check_is_scoped_to_doctors() {
        let schedules = DOCTOR_DEPENDENCIES.iter().find(|c| c.table == "schedules").unwrap();
        assert_eq!(schedules.extra_filter, Some("staff_type=eq.doctor"));
    }
}
