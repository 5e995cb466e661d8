use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.supabase_jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

pub fn ensure_role(user: &User, allowed: &[Role]) -> Result<Role, AppError> {
    match user.app_role() {
        Some(role) if allowed.contains(&role) => Ok(role),
        _ => Err(AppError::Forbidden(format!(
            "This area is restricted to: {}",
            allowed.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
        ))),
    }
}

async fn guard(allowed: &[Role], request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = extract_user(&request)?;
    ensure_role(&user, allowed)?;
    Ok(next.run(request).await)
}

/// Layer after `auth_middleware`.
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    guard(&[Role::Admin], request, next).await
}

pub async fn require_doctor(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    guard(&[Role::Doctor], request, next).await
}

pub async fn require_labtech(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    guard(&[Role::LabTech], request, next).await
}
