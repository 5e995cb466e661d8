use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{eq_filter, DependencyCheck, SupabaseClient};
use shared_models::auth::Role;
use shared_models::pagination::Page;

use crate::models::{
    CreateLabTechnicianRequest, DeletionOutcome, LabTechnician, LabTechnicianProfile, StaffError,
    StaffKind, StaffSearchQuery, UpdateLabTechnicianRequest, UserAccount,
};
use crate::services::account::AccountService;

const KIND: StaffKind = StaffKind::LabTech;

pub const LAB_TECHNICIAN_DEPENDENCIES: [DependencyCheck; 2] = [
    DependencyCheck::new("test_results", "technician_id", "test results"),
    DependencyCheck::new("schedules", "staff_id", "schedules").with_filter("staff_type=eq.labtech"),
];

pub struct LabTechnicianService {
    accounts: AccountService,
    supabase: SupabaseClient,
}

impl LabTechnicianService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            accounts: AccountService::new(config),
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_lab_technicians(
        &self,
        query: StaffSearchQuery,
        auth_token: &str,
    ) -> Result<Page<LabTechnicianProfile>, StaffError> {
        self.accounts.list_staff(KIND, query, false, Some(auth_token)).await
    }

    pub async fn get_lab_technician(
        &self,
        technician_id: Uuid,
        auth_token: &str,
    ) -> Result<LabTechnicianProfile, StaffError> {
        self.accounts.get_staff(KIND, technician_id, Some(auth_token)).await
    }

    pub async fn create_lab_technician(
        &self,
        request: CreateLabTechnicianRequest,
        auth_token: &str,
    ) -> Result<LabTechnicianProfile, StaffError> {
        self.accounts.ensure_specialty(request.specialty_id, auth_token).await?;

        let account = self.accounts.create_account(request.account, Role::LabTech, auth_token).await?;

        let now = Utc::now().to_rfc3339();
        let data = json!({
            "user_id": account.id,
            "specialty_id": request.specialty_id,
            "specialization": request.specialization,
            "created_at": now,
            "updated_at": now
        });

        let inserted: Result<Vec<LabTechnician>, _> =
            self.supabase.insert(KIND.table(), data, Some(auth_token)).await;
        let technician = match inserted.map_err(StaffError::from).and_then(|rows| {
            rows.into_iter().next().ok_or(StaffError::WriteFailed("create lab technician"))
        }) {
            Ok(technician) => technician,
            Err(e) => {
                self.accounts.discard_account(&account, auth_token).await;
                return Err(e);
            }
        };

        info!("Created lab technician {} for account {}", technician.id, account.id);
        self.get_lab_technician(technician.id, auth_token).await
    }

    pub async fn update_lab_technician(
        &self,
        technician_id: Uuid,
        request: UpdateLabTechnicianRequest,
        auth_token: &str,
    ) -> Result<LabTechnicianProfile, StaffError> {
        let profile = self.get_lab_technician(technician_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(specialty_id) = request.specialty_id {
            self.accounts.ensure_specialty(specialty_id, auth_token).await?;
            update_data.insert("specialty_id".to_string(), json!(specialty_id));
        }
        if let Some(specialization) = request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }

        let account_update = self.accounts
            .prepare_account_update(&profile.user, request.account, auth_token)
            .await?;
        self.accounts.apply_account_update(account_update, auth_token).await?;

        if !update_data.is_empty() {
            update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
            let filter = eq_filter("id", &technician_id.to_string());
            let _: Vec<Value> = self.supabase
                .update(KIND.table(), &filter, Value::Object(update_data), Some(auth_token))
                .await?;
        }

        info!("Updated lab technician {}", technician_id);
        self.get_lab_technician(technician_id, auth_token).await
    }

    pub async fn update_avatar(
        &self,
        technician_id: Uuid,
        image: &str,
        auth_token: &str,
    ) -> Result<UserAccount, StaffError> {
        let profile = self.get_lab_technician(technician_id, auth_token).await?;
        self.accounts.replace_avatar(&profile.user, image, auth_token).await
    }

    pub async fn reactivate_lab_technician(
        &self,
        technician_id: Uuid,
        auth_token: &str,
    ) -> Result<UserAccount, StaffError> {
        let profile = self.get_lab_technician(technician_id, auth_token).await?;
        self.accounts.reactivate(&profile.user, auth_token).await
    }

    pub async fn delete_lab_technician(
        &self,
        technician_id: Uuid,
        auth_token: &str,
    ) -> Result<DeletionOutcome, StaffError> {
        let profile = self.get_lab_technician(technician_id, auth_token).await?;
        self.accounts
            .retire_staff(KIND, technician_id, &profile.user, &LAB_TECHNICIAN_DEPENDENCIES, auth_token)
            .await
    }
}
