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
    CreateServiceRequest, MedicalService, ServiceDetail, ServiceError, ServiceSearchQuery,
    UpdateServiceRequest,
};

const TABLE: &str = "services";

pub const SERVICE_DEPENDENCIES: [DependencyCheck; 2] = [
    DependencyCheck::new("appointments", "service_id", "appointments"),
    DependencyCheck::new("test_results", "service_id", "test results"),
];

pub struct MedicalServiceService {
    supabase: SupabaseClient,
    assets: AssetStore,
}

impl MedicalServiceService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            assets: AssetStore::from_config(config),
        }
    }

    pub async fn list_services(
        &self,
        query: ServiceSearchQuery,
        auth_token: Option<&str>,
    ) -> Result<Page<MedicalService>, ServiceError> {
        debug!("Listing services: {:?}", query);

        let mut query_parts = vec!["select=*".to_string()];
        if let Some(specialty_id) = query.specialty_id {
            query_parts.push(format!("specialty_id=eq.{}", specialty_id));
        }
        if let Some(service_type) = query.service_type {
            query_parts.push(format!("service_type=eq.{}", service_type.as_str()));
        }
        if let Some(min_price) = query.min_price {
            query_parts.push(format!("price=gte.{}", min_price));
        }
        if let Some(max_price) = query.max_price {
            query_parts.push(format!("price=lte.{}", max_price));
        }
        query_parts.push("order=name.asc".to_string());

        let services: Vec<MedicalService> = self.supabase
            .select(TABLE, &query_parts.join("&"), auth_token)
            .await?;

        let needle = query.name.as_deref().map(|n| n.trim().to_lowercase()).filter(|n| !n.is_empty());
        let filtered = services
            .into_iter()
            .filter(|s| needle.as_ref().map_or(true, |n| s.name.to_lowercase().contains(n)))
            .collect();

        Ok(Page::paginate(filtered, &PageQuery { page: query.page, per_page: query.per_page }))
    }

    pub async fn get_service(
        &self,
        service_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<MedicalService, ServiceError> {
        self.supabase
            .select_one(TABLE, &eq_filter("id", &service_id.to_string()), auth_token)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn get_service_detail(
        &self,
        service_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<ServiceDetail, ServiceError> {
        let query = format!(
            "select=*,specialty:specialties(id,name)&{}",
            eq_filter("id", &service_id.to_string())
        );
        self.supabase
            .select_one(TABLE, &query, auth_token)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    async fn ensure_unique_name(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), ServiceError> {
        let mut filter = eq_filter("name", name);
        if let Some(id) = exclude_id {
            filter.push_str(&format!("&id=neq.{}", id));
        }

        if self.supabase.exists(TABLE, &filter, Some(auth_token)).await? {
            return Err(ServiceError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn validate_price(price: f64) -> Result<(), ServiceError> {
        if !price.is_finite() || price < 0.0 {
            return Err(ServiceError::Validation("Price must be zero or positive".to_string()));
        }
        Ok(())
    }

    pub async fn create_service(
        &self,
        request: CreateServiceRequest,
        auth_token: &str,
    ) -> Result<MedicalService, ServiceError> {
        let name = request.name.trim().to_string();
        require_non_empty("Service name", &name).map_err(ServiceError::Validation)?;
        Self::validate_price(request.price)?;
        self.ensure_unique_name(&name, None, auth_token).await?;

        let image_path = match request.image.as_deref() {
            Some(image) => Some(self.assets.save_base64(AssetCategory::Services, image).await?),
            None => None,
        };

        let now = Utc::now().to_rfc3339();
        let data = json!({
            "name": name,
            "description": request.description,
            "price": request.price,
            "service_type": request.service_type,
            "specialty_id": request.specialty_id,
            "image_path": image_path,
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<MedicalService> = match self.supabase.insert(TABLE, data, Some(auth_token)).await {
            Ok(rows) => rows,
            Err(e) => {
                if let Some(path) = image_path.as_deref() {
                    self.assets.remove(path).await;
                }
                return Err(e.into());
            }
        };

        let service = created.into_iter().next().ok_or(ServiceError::WriteFailed("create"))?;
        info!("Created service {} ({})", service.name, service.id);
        Ok(service)
    }

    pub async fn update_service(
        &self,
        service_id: Uuid,
        request: UpdateServiceRequest,
        auth_token: &str,
    ) -> Result<MedicalService, ServiceError> {
        let existing = self.get_service(service_id, Some(auth_token)).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name.as_deref().map(str::trim) {
            require_non_empty("Service name", name).map_err(ServiceError::Validation)?;
            if name != existing.name {
                self.ensure_unique_name(name, Some(service_id), auth_token).await?;
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(price) = request.price {
            Self::validate_price(price)?;
            update_data.insert("price".to_string(), json!(price));
        }
        if let Some(service_type) = request.service_type {
            update_data.insert("service_type".to_string(), json!(service_type));
        }
        if let Some(specialty_id) = request.specialty_id {
            update_data.insert("specialty_id".to_string(), json!(specialty_id));
        }

        let new_image = match request.image.as_deref() {
            Some(image) => Some(self.assets.save_base64(AssetCategory::Services, image).await?),
            None => None,
        };
        if let Some(path) = &new_image {
            update_data.insert("image_path".to_string(), json!(path));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated = self.supabase
            .update(TABLE, &eq_filter("id", &service_id.to_string()), Value::Object(update_data), Some(auth_token))
            .await
            .map_err(ServiceError::from)
            .and_then(|rows: Vec<MedicalService>| rows.into_iter().next().ok_or(ServiceError::NotFound));
        let service = match updated {
            Ok(service) => service,
            Err(e) => {
                if let Some(path) = &new_image {
                    self.assets.remove(path).await;
                }
                return Err(e);
            }
        };

        if let Some(path) = &new_image {
            self.assets.remove_superseded(existing.image_path.as_deref(), path).await;
        }

        info!("Updated service {}", service_id);
        Ok(service)
    }

    pub async fn delete_service(&self, service_id: Uuid, auth_token: &str) -> Result<(), ServiceError> {
        let id = service_id.to_string();

        let blocking = blocking_references(&self.supabase, &SERVICE_DEPENDENCIES, &id, Some(auth_token)).await?;
        if !blocking.is_empty() {
            warn!("Refusing to delete service {}: referenced by {:?}", id, blocking);
            return Err(ServiceError::InUse(blocking));
        }

        let deleted = self.supabase.delete(TABLE, &eq_filter("id", &id), Some(auth_token)).await?;
        let row = deleted.into_iter().next().ok_or(ServiceError::NotFound)?;

        if let Some(image) = row["image_path"].as_str() {
            self.assets.remove(image).await;
        }

        info!("Deleted service {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_price_validation() {
        assert!(MedicalServiceService::validate_price(0.0).is_ok());
        assert!(MedicalServiceService::validate_price(250000.0).is_ok());
        assert_matches!(MedicalServiceService::validate_price(-1.0), Err(ServiceError::Validation(_)));
        assert_matches!(MedicalServiceService::validate_price(f64::NAN), Err(ServiceError::Validation(_)));
    }
}
