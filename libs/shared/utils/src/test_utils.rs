use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, DEFAULT_AVATAR_PATH};
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub public_assets_dir: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            public_assets_dir: std::env::temp_dir().join("hospital-test-assets"),
        }
    }
}

impl TestConfig {
    /// Points the data layer at a mock PostgREST server.
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_assets_dir(mut self, dir: &Path) -> Self {
        self.public_assets_dir = dir.to_path_buf();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            public_assets_dir: self.public_assets_dir.clone(),
            default_avatar_path: DEFAULT_AVATAR_PATH.to_string(),
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn labtech(email: &str) -> Self {
        Self::new(email, "labtech")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    /// `Bearer <token>` header value for an admin signed with the default test secret.
    pub fn admin_bearer() -> String {
        let admin = TestUser::admin("admin@example.com");
        format!("Bearer {}", Self::create_test_token(&admin, &TestConfig::default().jwt_secret, Some(1)))
    }

    pub fn bearer_for(user: &TestUser) -> String {
        format!("Bearer {}", Self::create_test_token(user, &TestConfig::default().jwt_secret, Some(1)))
    }
}

/// PostgREST row fixtures shaped like the hospital tables.
pub struct MockRows;

impl MockRows {
    fn stamps() -> (String, String) {
        let now = Utc::now().to_rfc3339();
        (now.clone(), now)
    }

    pub fn specialty(id: &str, name: &str) -> serde_json::Value {
        let (created_at, updated_at) = Self::stamps();
        json!({
            "id": id,
            "name": name,
            "description": "Department description",
            "icon_path": null,
            "head_doctor_id": null,
            "created_at": created_at,
            "updated_at": updated_at
        })
    }

    pub fn room(id: &str, room_number: &str, status: &str) -> serde_json::Value {
        let (created_at, updated_at) = Self::stamps();
        json!({
            "id": id,
            "room_number": room_number,
            "room_type": "examination",
            "capacity": 2,
            "status": status,
            "specialty_id": null,
            "notes": null,
            "created_at": created_at,
            "updated_at": updated_at
        })
    }

    pub fn service(id: &str, name: &str, specialty_id: &str) -> serde_json::Value {
        let (created_at, updated_at) = Self::stamps();
        json!({
            "id": id,
            "name": name,
            "description": null,
            "price": 150000.0,
            "service_type": "examination",
            "specialty_id": specialty_id,
            "image_path": null,
            "created_at": created_at,
            "updated_at": updated_at
        })
    }

    pub fn user(id: &str, email: &str, full_name: &str, role: &str) -> serde_json::Value {
        let (created_at, updated_at) = Self::stamps();
        json!({
            "id": id,
            "email": email,
            "full_name": full_name,
            "phone": null,
            "gender": null,
            "date_of_birth": null,
            "address": null,
            "role": role,
            "status": "active",
            "avatar_url": DEFAULT_AVATAR_PATH,
            "created_at": created_at,
            "updated_at": updated_at
        })
    }

    pub fn doctor(id: &str, user_id: &str, specialty_id: &str) -> serde_json::Value {
        let (created_at, updated_at) = Self::stamps();
        json!({
            "id": id,
            "user_id": user_id,
            "specialty_id": specialty_id,
            "license_number": "MD-0001",
            "experience_years": 8,
            "education": "Medical University",
            "biography": null,
            "created_at": created_at,
            "updated_at": updated_at
        })
    }

    pub fn lab_technician(id: &str, user_id: &str, specialty_id: &str) -> serde_json::Value {
        let (created_at, updated_at) = Self::stamps();
        json!({
            "id": id,
            "user_id": user_id,
            "specialty_id": specialty_id,
            "specialization": "Hematology",
            "created_at": created_at,
            "updated_at": updated_at
        })
    }

    pub fn schedule(id: &str, staff_id: &str, room_id: &str, work_date: &str, start: &str, end: &str) -> serde_json::Value {
        let (created_at, updated_at) = Self::stamps();
        json!({
            "id": id,
            "staff_id": staff_id,
            "staff_type": "doctor",
            "work_date": work_date,
            "start_time": start,
            "end_time": end,
            "room_id": room_id,
            "status": "scheduled",
            "notes": null,
            "created_at": created_at,
            "updated_at": updated_at
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "code": code,
            "details": null,
            "hint": null,
            "message": message
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_supabase_url("http://mock:1234");
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://mock:1234");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::labtech("lab@example.com");
        assert_eq!(user.role, "labtech");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
        assert!(JwtTestUtils::admin_bearer().starts_with("Bearer "));
    }
}
