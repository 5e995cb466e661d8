use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{blocking_references, eq_filter, DependencyCheck, SupabaseClient};
use shared_models::auth::Role;
use shared_models::pagination::{Page, PageQuery};
use shared_utils::uploads::{AssetCategory, AssetStore};
use shared_utils::validation::{require_non_empty, validate_email, validate_password, validate_phone};

use crate::models::{
    AccountChanges, DeletionOutcome, NewAccount, StaffError, StaffKind, StaffProfile,
    StaffSearchQuery, UserAccount, UserStatus, USER_COLUMNS,
};
use crate::services::password::hash_password;

const USERS: &str = "users";

#[derive(Deserialize)]
struct StaffStatusRow {
    user: StaffStatusUser,
}

#[derive(Deserialize)]
struct StaffStatusUser {
    status: UserStatus,
}

/// A validated set of `users` column changes.
#[derive(Debug)]
pub struct AccountUpdate {
    user_id: Uuid,
    data: serde_json::Map<String, Value>,
}

/// Account lifecycle shared by doctors and lab technicians: the `users` row,
/// its avatar file, and the staff-table row that points at it.
pub struct AccountService {
    supabase: SupabaseClient,
    assets: AssetStore,
    default_avatar: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            assets: AssetStore::from_config(config),
            default_avatar: config.default_avatar_path.clone(),
        }
    }

    fn profile_select() -> String {
        format!(
            "select=*,user:users!inner({}),specialty:specialties(id,name)",
            USER_COLUMNS
        )
    }

    pub async fn list_staff<T: DeserializeOwned>(
        &self,
        kind: StaffKind,
        query: StaffSearchQuery,
        active_only: bool,
        auth_token: Option<&str>,
    ) -> Result<Page<StaffProfile<T>>, StaffError> {
        debug!("Listing {}: {:?}", kind.table(), query);

        let mut query_parts = vec![Self::profile_select()];
        if let Some(specialty_id) = query.specialty_id {
            query_parts.push(format!("specialty_id=eq.{}", specialty_id));
        }
        let status = if active_only { Some(UserStatus::Active) } else { query.status };
        if let Some(status) = status {
            query_parts.push(format!("user.status=eq.{}", status.as_str()));
        }

        let mut rows: Vec<StaffProfile<T>> = self.supabase
            .select(kind.table(), &query_parts.join("&"), auth_token)
            .await?;

        let needle = query.name.as_deref().map(|n| n.trim().to_lowercase()).filter(|n| !n.is_empty());
        if let Some(needle) = needle {
            rows.retain(|row| row.user.full_name.to_lowercase().contains(&needle));
        }
        rows.sort_by(|a, b| a.user.full_name.cmp(&b.user.full_name));

        Ok(Page::paginate(rows, &PageQuery { page: query.page, per_page: query.per_page }))
    }

    pub async fn get_staff<T: DeserializeOwned>(
        &self,
        kind: StaffKind,
        staff_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<StaffProfile<T>, StaffError> {
        let query = format!("{}&{}", Self::profile_select(), eq_filter("id", &staff_id.to_string()));
        self.supabase
            .select_one(kind.table(), &query, auth_token)
            .await?
            .ok_or(StaffError::NotFound(kind.label()))
    }

    /// Staff-table id of the account with `user_id`, if it has one of `kind`.
    pub async fn staff_id_for_user(
        &self,
        kind: StaffKind,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Option<Uuid>, StaffError> {
        let query = format!("select=id&{}", eq_filter("user_id", user_id));
        let row: Option<Value> = self.supabase.select_one(kind.table(), &query, Some(auth_token)).await?;
        Ok(row.and_then(|r| r["id"].as_str().and_then(|id| id.parse().ok())))
    }

    /// Account status behind a staff row, or `None` if the row does not exist.
    pub async fn staff_status(
        &self,
        kind: StaffKind,
        staff_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<UserStatus>, StaffError> {
        let query = format!("select=id,user:users!inner(status)&{}", eq_filter("id", &staff_id.to_string()));
        let row: Option<StaffStatusRow> = self.supabase
            .select_one(kind.table(), &query, Some(auth_token))
            .await?;
        Ok(row.map(|r| r.user.status))
    }

    pub async fn ensure_specialty(&self, specialty_id: Uuid, auth_token: &str) -> Result<(), StaffError> {
        let filter = eq_filter("id", &specialty_id.to_string());
        if !self.supabase.exists("specialties", &filter, Some(auth_token)).await? {
            return Err(StaffError::UnknownSpecialty(specialty_id));
        }
        Ok(())
    }

    pub async fn get_account(&self, user_id: Uuid, auth_token: &str) -> Result<UserAccount, StaffError> {
        let query = format!("select={}&{}", USER_COLUMNS, eq_filter("id", &user_id.to_string()));
        self.supabase
            .select_one(USERS, &query, Some(auth_token))
            .await?
            .ok_or(StaffError::NotFound("Account"))
    }

    async fn ensure_unique_email(
        &self,
        email: &str,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), StaffError> {
        let mut filter = eq_filter("email", email);
        if let Some(id) = exclude_id {
            filter.push_str(&format!("&id=neq.{}", id));
        }

        if self.supabase.exists(USERS, &filter, Some(auth_token)).await? {
            return Err(StaffError::DuplicateEmail(email.to_string()));
        }
        Ok(())
    }

    fn normalize_email(email: &str) -> Result<String, StaffError> {
        let email = email.trim().to_lowercase();
        validate_email(&email).map_err(StaffError::Validation)?;
        Ok(email)
    }

    fn check_phone(phone: Option<&str>) -> Result<(), StaffError> {
        match phone.map(str::trim).filter(|p| !p.is_empty()) {
            Some(phone) => validate_phone(phone).map_err(StaffError::Validation),
            None => Ok(()),
        }
    }

    pub async fn create_account(
        &self,
        account: NewAccount,
        role: Role,
        auth_token: &str,
    ) -> Result<UserAccount, StaffError> {
        let email = Self::normalize_email(&account.email)?;
        validate_password(&account.password).map_err(StaffError::Validation)?;
        require_non_empty("Full name", &account.full_name).map_err(StaffError::Validation)?;
        Self::check_phone(account.phone.as_deref())?;
        self.ensure_unique_email(&email, None, auth_token).await?;

        let password_hash = hash_password(&account.password)?;

        let uploaded = match account.avatar.as_deref() {
            Some(image) => Some(self.assets.save_base64(AssetCategory::Avatars, image).await?),
            None => None,
        };
        let avatar_url = uploaded.clone().unwrap_or_else(|| self.default_avatar.clone());

        let now = Utc::now().to_rfc3339();
        let data = json!({
            "email": email,
            "password_hash": password_hash,
            "full_name": account.full_name.trim(),
            "phone": account.phone,
            "gender": account.gender,
            "date_of_birth": account.date_of_birth,
            "address": account.address,
            "role": role.as_str(),
            "status": UserStatus::Active,
            "avatar_url": avatar_url,
            "created_at": now,
            "updated_at": now
        });

        let inserted: Result<Vec<UserAccount>, _> = self.supabase
            .insert_returning(USERS, USER_COLUMNS, data, Some(auth_token))
            .await;

        let created = match inserted {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                if let Some(path) = uploaded.as_deref() {
                    self.assets.remove(path).await;
                }
                return Err(e.into());
            }
        };

        let user = created.ok_or(StaffError::WriteFailed("create account"))?;
        info!("Created {} account {}", role, user.id);
        Ok(user)
    }

    /// Undoes `create_account` when the staff row could not be written.
    pub async fn discard_account(&self, account: &UserAccount, auth_token: &str) {
        let filter = eq_filter("id", &account.id.to_string());
        if let Err(e) = self.supabase.delete(USERS, &filter, Some(auth_token)).await {
            warn!("Failed to remove orphaned account {}: {}", account.id, e);
        }
        self.remove_avatar(account.avatar_url.as_deref()).await;
    }

    /// Validates account changes without writing anything; pair with
    /// `apply_account_update` once the rest of the request has been checked.
    pub async fn prepare_account_update(
        &self,
        account: &UserAccount,
        changes: AccountChanges,
        auth_token: &str,
    ) -> Result<AccountUpdate, StaffError> {
        let mut update_data = serde_json::Map::new();

        if let Some(email) = changes.email.as_deref() {
            let email = Self::normalize_email(email)?;
            if email != account.email {
                self.ensure_unique_email(&email, Some(account.id), auth_token).await?;
                update_data.insert("email".to_string(), json!(email));
            }
        }
        if let Some(password) = changes.password.as_deref() {
            validate_password(password).map_err(StaffError::Validation)?;
            update_data.insert("password_hash".to_string(), json!(hash_password(password)?));
        }
        if let Some(full_name) = changes.full_name.as_deref().map(str::trim) {
            require_non_empty("Full name", full_name).map_err(StaffError::Validation)?;
            update_data.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(phone) = changes.phone {
            Self::check_phone(Some(&phone))?;
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(gender) = changes.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(date_of_birth) = changes.date_of_birth {
            update_data.insert("date_of_birth".to_string(), json!(date_of_birth));
        }
        if let Some(address) = changes.address {
            update_data.insert("address".to_string(), json!(address));
        }

        Ok(AccountUpdate {
            user_id: account.id,
            data: update_data,
        })
    }

    pub async fn apply_account_update(&self, update: AccountUpdate, auth_token: &str) -> Result<(), StaffError> {
        let AccountUpdate { user_id, mut data } = update;
        if data.is_empty() {
            return Ok(());
        }
        data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.patch_account(user_id, Value::Object(data), auth_token).await?;
        info!("Updated account {}", user_id);
        Ok(())
    }

    async fn patch_account(&self, user_id: Uuid, data: Value, auth_token: &str) -> Result<UserAccount, StaffError> {
        let filter = format!("{}&select={}", eq_filter("id", &user_id.to_string()), USER_COLUMNS);
        let updated: Vec<UserAccount> = self.supabase.update(USERS, &filter, data, Some(auth_token)).await?;
        updated.into_iter().next().ok_or(StaffError::NotFound("Account"))
    }

    /// Stores the new avatar, then deletes the previous file unless it is the shared default.
    pub async fn replace_avatar(
        &self,
        account: &UserAccount,
        encoded: &str,
        auth_token: &str,
    ) -> Result<UserAccount, StaffError> {
        let new_path = self.assets.save_base64(AssetCategory::Avatars, encoded).await?;

        let data = json!({
            "avatar_url": new_path,
            "updated_at": Utc::now().to_rfc3339()
        });
        let updated = match self.patch_account(account.id, data, auth_token).await {
            Ok(user) => user,
            Err(e) => {
                self.assets.remove(&new_path).await;
                return Err(e);
            }
        };

        if account.avatar_url.as_deref() != Some(new_path.as_str()) {
            self.remove_avatar(account.avatar_url.as_deref()).await;
        }

        info!("Replaced avatar of account {}", account.id);
        Ok(updated)
    }

    async fn remove_avatar(&self, path: Option<&str>) {
        match path {
            Some(path) if !path.is_empty() && path != self.default_avatar => {
                self.assets.remove(path).await;
            }
            _ => {}
        }
    }

    pub async fn reactivate(&self, account: &UserAccount, auth_token: &str) -> Result<UserAccount, StaffError> {
        if account.status == UserStatus::Active {
            return Err(StaffError::AlreadyActive);
        }

        let mut data = json!({
            "status": UserStatus::Active,
            "updated_at": Utc::now().to_rfc3339()
        });
        if let Some(email) = original_email(&account.email) {
            self.ensure_unique_email(email, Some(account.id), auth_token).await?;
            data["email"] = json!(email);
        }
        let user = self.patch_account(account.id, data, auth_token).await?;

        info!("Reactivated account {}", account.id);
        Ok(user)
    }

    /// Deletes the staff member outright when nothing references it; otherwise
    /// keeps the rows, deactivates the account and frees its email address.
    pub async fn retire_staff(
        &self,
        kind: StaffKind,
        staff_id: Uuid,
        account: &UserAccount,
        checks: &[DependencyCheck],
        auth_token: &str,
    ) -> Result<DeletionOutcome, StaffError> {
        let id = staff_id.to_string();
        let blocking = blocking_references(&self.supabase, checks, &id, Some(auth_token)).await?;

        if !blocking.is_empty() {
            let already_retired = original_email(&account.email).is_some();
            if account.status == UserStatus::Active || !already_retired {
                let mut data = json!({
                    "status": UserStatus::Inactive,
                    "updated_at": Utc::now().to_rfc3339()
                });
                if !already_retired {
                    data["email"] = json!(retired_email(&account.email, Utc::now().timestamp()));
                }
                self.patch_account(account.id, data, auth_token).await?;
            }

            warn!("{} {} is referenced by {:?}; account deactivated", kind.label(), id, blocking);
            return Ok(DeletionOutcome::Deactivated {
                referenced_by: blocking.into_iter().map(String::from).collect(),
            });
        }

        let _: Value = self.supabase
            .rpc(
                "delete_staff_account",
                json!({
                    "p_staff_table": kind.table(),
                    "p_staff_id": staff_id,
                    "p_user_id": account.id
                }),
                Some(auth_token),
            )
            .await?;

        self.remove_avatar(account.avatar_url.as_deref()).await;

        info!("Deleted {} {} and account {}", kind.as_str(), id, account.id);
        Ok(DeletionOutcome::Deleted)
    }
}

/// `deleted.<unix-ts>.<email>`, leaving the original address free for reuse.
pub fn retired_email(email: &str, timestamp: i64) -> String {
    format!("deleted.{}.{}", timestamp, email)
}

/// The address a retired account was registered under, if `email` carries the
/// `deleted.<ts>.` prefix.
pub fn original_email(email: &str) -> Option<&str> {
    let (timestamp, original) = email.strip_prefix("deleted.")?.split_once('.')?;
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) || original.is_empty() {
        return None;
    }
    Some(original)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retired_email_format() {
        assert_eq!(
            retired_email("dr.lan@hospital.vn", 1_704_067_200),
            "deleted.1704067200.dr.lan@hospital.vn"
        );
    }

    #[test]
    fn test_original_email_strips_retired_prefix() {
        let retired = retired_email("dr.lan@hospital.vn", 1_704_067_200);
        assert_eq!(original_email(&retired), Some("dr.lan@hospital.vn"));
        assert_eq!(original_email("dr.lan@hospital.vn"), None);
        assert_eq!(original_email("deleted.soon@hospital.vn"), None);
        assert_eq!(original_email("deleted.123."), None);
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(
            AccountService::normalize_email("  Dr.Lan@Hospital.VN ").unwrap(),
            "dr.lan@hospital.vn"
        );
        assert!(AccountService::normalize_email("not-an-email").is_err());
    }
}
