use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::HeaderMap,
    Extension,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::jwt;
use staff_cell::AccountService;

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;
    let user = jwt::validate_token(token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        role: user.app_role().map(|r| r.to_string()).or(user.role),
        user_id: user.id,
        email: user.email,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;
    let valid = jwt::validate_token(token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

/// The caller's `users` row, without credentials.
#[axum::debug_handler]
pub async fn current_account(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    debug!("Loading account for user: {}", user.id);

    let user_id: Uuid = user.id
        .parse()
        .map_err(|_| AppError::Auth("Token subject is not an account id".to_string()))?;

    let accounts = AccountService::new(&config);
    let account = accounts.get_account(user_id, auth.token()).await?;

    Ok(Json(json!({
        "account": account,
        "role": user.app_role()
    })))
}
