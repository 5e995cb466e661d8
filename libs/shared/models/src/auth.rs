use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Role-scoped areas of the application. Every account carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    #[serde(rename = "labtech")]
    LabTech,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::LabTech => "labtech",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "labtech" => Ok(Role::LabTech),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Application role taken from the token claim, falling back to
    /// `user_metadata.role` for provider tokens whose `role` is `authenticated`.
    pub fn app_role(&self) -> Option<Role> {
        self.role
            .as_deref()
            .and_then(|r| r.parse().ok())
            .or_else(|| {
                self.metadata
                    .as_ref()
                    .and_then(|m| m["role"].as_str())
                    .and_then(|r| r.parse().ok())
            })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.app_role() == Some(role)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_with(role: Option<&str>, metadata: Option<serde_json::Value>) -> User {
        User {
            id: "u-1".to_string(),
            email: None,
            role: role.map(str::to_string),
            metadata,
            created_at: None,
        }
    }

    #[test]
    fn test_role_claim_is_parsed() {
        assert_eq!(user_with(Some("admin"), None).app_role(), Some(Role::Admin));
        assert_eq!(user_with(Some("labtech"), None).app_role(), Some(Role::LabTech));
    }

    #[test]
    fn test_role_falls_back_to_metadata() {
        let user = user_with(Some("authenticated"), Some(json!({"role": "doctor"})));
        assert!(user.has_role(Role::Doctor));
        assert!(!user.has_role(Role::Admin));
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_value(Role::LabTech).unwrap(), json!("labtech"));
        let role: Role = serde_json::from_value(json!("patient")).unwrap();
        assert_eq!(role, Role::Patient);
    }
}
