use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{blocking_references, eq_filter, DependencyCheck, SupabaseClient};
use shared_models::pagination::{Page, PageQuery};
use shared_utils::uploads::{AssetCategory, AssetStore};
use shared_utils::validation::require_non_empty;

use crate::models::{
    AssignHeadDoctorRequest, CreateSpecialtyRequest, Specialty, SpecialtyDetail, SpecialtyDoctor,
    SpecialtyError, SpecialtySearchQuery, SpecialtyServiceItem, UpdateSpecialtyRequest,
};

const TABLE: &str = "specialties";

/// Rows that keep a specialty from being deleted.
pub const SPECIALTY_DEPENDENCIES: [DependencyCheck; 4] = [
    DependencyCheck::new("doctors", "specialty_id", "doctors"),
    DependencyCheck::new("lab_technicians", "specialty_id", "lab technicians"),
    DependencyCheck::new("services", "specialty_id", "services"),
    DependencyCheck::new("rooms", "specialty_id", "rooms"),
];

pub struct SpecialtyService {
    supabase: SupabaseClient,
    assets: AssetStore,
}

impl SpecialtyService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            assets: AssetStore::from_config(config),
        }
    }

    pub async fn list_specialties(
        &self,
        query: SpecialtySearchQuery,
        auth_token: Option<&str>,
    ) -> Result<Page<Specialty>, SpecialtyError> {
        debug!("Listing specialties: {:?}", query);

        let specialties: Vec<Specialty> = self.supabase
            .select(TABLE, "select=*&order=name.asc", auth_token)
            .await?;

        let needle = query.name.as_deref().map(|n| n.trim().to_lowercase()).filter(|n| !n.is_empty());
        let filtered = specialties
            .into_iter()
            .filter(|s| match &needle {
                Some(n) => s.name.to_lowercase().contains(n),
                None => true,
            })
            .collect();

        let page = PageQuery { page: query.page, per_page: query.per_page };
        Ok(Page::paginate(filtered, &page))
    }

    pub async fn get_specialty(
        &self,
        specialty_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Specialty, SpecialtyError> {
        let filter = eq_filter("id", &specialty_id.to_string());
        self.supabase
            .select_one(TABLE, &filter, auth_token)
            .await?
            .ok_or(SpecialtyError::NotFound)
    }

    pub async fn get_specialty_detail(
        &self,
        specialty_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<SpecialtyDetail, SpecialtyError> {
        debug!("Fetching specialty detail: {}", specialty_id);

        let id = specialty_id.to_string();
        let doctors_query = format!(
            "select=id,experience_years,user:users!inner(full_name,avatar_url)&{}&user.status=eq.active",
            eq_filter("specialty_id", &id)
        );
        let services_query = format!(
            "select=id,name,price,service_type&{}&order=name.asc",
            eq_filter("specialty_id", &id)
        );

        let (specialty, doctors, services) = tokio::try_join!(
            self.get_specialty(specialty_id, auth_token),
            async {
                self.supabase
                    .select::<SpecialtyDoctor>("doctors", &doctors_query, auth_token)
                    .await
                    .map_err(SpecialtyError::from)
            },
            async {
                self.supabase
                    .select::<SpecialtyServiceItem>("services", &services_query, auth_token)
                    .await
                    .map_err(SpecialtyError::from)
            },
        )?;

        Ok(SpecialtyDetail { specialty, doctors, services })
    }

    async fn ensure_unique_name(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), SpecialtyError> {
        let mut filter = eq_filter("name", name);
        if let Some(id) = exclude_id {
            filter.push_str(&format!("&id=neq.{}", id));
        }

        if self.supabase.exists(TABLE, &filter, Some(auth_token)).await? {
            return Err(SpecialtyError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub async fn create_specialty(
        &self,
        request: CreateSpecialtyRequest,
        auth_token: &str,
    ) -> Result<Specialty, SpecialtyError> {
        let name = request.name.trim().to_string();
        require_non_empty("Specialty name", &name).map_err(SpecialtyError::Validation)?;
        self.ensure_unique_name(&name, None, auth_token).await?;

        let icon_path = match request.icon.as_deref() {
            Some(icon) => Some(self.assets.save_base64(AssetCategory::Specialties, icon).await?),
            None => None,
        };

        let now = Utc::now().to_rfc3339();
        let data = json!({
            "name": name,
            "description": request.description,
            "icon_path": icon_path,
            "created_at": now,
            "updated_at": now
        });

        let inserted: Result<Vec<Specialty>, _> = self.supabase.insert(TABLE, data, Some(auth_token)).await;
        let created = match inserted {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                if let Some(path) = icon_path.as_deref() {
                    self.assets.remove(path).await;
                }
                return Err(e.into());
            }
        };

        let specialty = created.ok_or(SpecialtyError::WriteFailed("create"))?;
        info!("Created specialty {} ({})", specialty.name, specialty.id);
        Ok(specialty)
    }

    pub async fn update_specialty(
        &self,
        specialty_id: Uuid,
        request: UpdateSpecialtyRequest,
        auth_token: &str,
    ) -> Result<Specialty, SpecialtyError> {
        let existing = self.get_specialty(specialty_id, Some(auth_token)).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name.as_deref().map(str::trim) {
            require_non_empty("Specialty name", name).map_err(SpecialtyError::Validation)?;
            if name != existing.name {
                self.ensure_unique_name(name, Some(specialty_id), auth_token).await?;
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }

        let new_icon = match request.icon.as_deref() {
            Some(icon) => Some(self.assets.save_base64(AssetCategory::Specialties, icon).await?),
            None => None,
        };
        if let Some(path) = &new_icon {
            update_data.insert("icon_path".to_string(), json!(path));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = eq_filter("id", &specialty_id.to_string());
        let updated = self.supabase
            .update(TABLE, &filter, Value::Object(update_data), Some(auth_token))
            .await
            .map_err(SpecialtyError::from)
            .and_then(|rows: Vec<Specialty>| rows.into_iter().next().ok_or(SpecialtyError::NotFound));
        let specialty = match updated {
            Ok(specialty) => specialty,
            Err(e) => {
                if let Some(path) = &new_icon {
                    self.assets.remove(path).await;
                }
                return Err(e);
            }
        };

        if let Some(path) = &new_icon {
            self.assets.remove_superseded(existing.icon_path.as_deref(), path).await;
        }

        info!("Updated specialty {}", specialty_id);
        Ok(specialty)
    }

    pub async fn assign_head_doctor(
        &self,
        specialty_id: Uuid,
        request: AssignHeadDoctorRequest,
        auth_token: &str,
    ) -> Result<Specialty, SpecialtyError> {
        self.get_specialty(specialty_id, Some(auth_token)).await?;

        if let Some(doctor_id) = request.doctor_id {
            let filter = format!(
                "{}&{}",
                eq_filter("id", &doctor_id.to_string()),
                eq_filter("specialty_id", &specialty_id.to_string())
            );
            if !self.supabase.exists("doctors", &filter, Some(auth_token)).await? {
                return Err(SpecialtyError::HeadDoctorNotInSpecialty(doctor_id));
            }
        }

        let filter = eq_filter("id", &specialty_id.to_string());
        let updated: Vec<Specialty> = self.supabase
            .update(
                TABLE,
                &filter,
                json!({
                    "head_doctor_id": request.doctor_id,
                    "updated_at": Utc::now().to_rfc3339()
                }),
                Some(auth_token),
            )
            .await?;

        info!("Head doctor of specialty {} set to {:?}", specialty_id, request.doctor_id);
        updated.into_iter().next().ok_or(SpecialtyError::NotFound)
    }

    pub async fn delete_specialty(
        &self,
        specialty_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SpecialtyError> {
        let id = specialty_id.to_string();

        let blocking = blocking_references(&self.supabase, &SPECIALTY_DEPENDENCIES, &id, Some(auth_token)).await?;
        if !blocking.is_empty() {
            warn!("Refusing to delete specialty {}: referenced by {:?}", id, blocking);
            return Err(SpecialtyError::InUse(blocking));
        }

        let deleted = self.supabase.delete(TABLE, &eq_filter("id", &id), Some(auth_token)).await?;
        let row = deleted.into_iter().next().ok_or(SpecialtyError::NotFound)?;

        if let Some(icon) = row["icon_path"].as_str() {
            self.assets.remove(icon).await;
        }

        info!("Deleted specialty {}", id);
        Ok(())
    }
}
