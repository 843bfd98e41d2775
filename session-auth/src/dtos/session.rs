use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Capability, Requirement, Role};
use crate::services::{AuthSession, TokenPair};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_at: pair.access_expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub capabilities: Vec<Capability>,
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            capabilities: role.capabilities(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub access_id: Uuid,
    pub roles: Vec<RoleResponse>,
}

impl From<&AuthSession> for SessionResponse {
    fn from(auth: &AuthSession) -> Self {
        Self {
            user_id: auth.user_id,
            access_id: auth.access_id,
            roles: auth.session.roles.iter().map(RoleResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AuthorizeRequest {
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub mode: MatchMode,
}

impl AuthorizeRequest {
    pub fn requirement(&self) -> Requirement {
        match self.mode {
            MatchMode::All => Requirement::all(&self.capabilities),
            MatchMode::Any => Requirement::any(&self.capabilities),
        }
    }
}
