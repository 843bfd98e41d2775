//! Identity collaborators: role lookup and credential lookup.
//!
//! The relational repository owns users and roles; the session layer only
//! reads them through these traits.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;

use crate::models::Role;

/// Stored login credentials for one user.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: i64,
    /// Argon2 PHC string
    pub password_hash: String,
}

#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, anyhow::Error>;
}

#[async_trait]
pub trait CredentialLookup: Send + Sync {
    async fn credentials_for(&self, username: &str) -> Result<Option<Credentials>, anyhow::Error>;
}

/// One user entry of a directory seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// In-memory directory implementing both lookups.
#[derive(Default)]
pub struct InMemoryDirectory {
    credentials: DashMap<String, Credentials>,
    roles: DashMap<i64, Vec<Role>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load users from a JSON array of [`SeedUser`].
    pub fn from_seed_file(path: &str) -> Result<Self, anyhow::Error> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read directory seed from {}: {}", path, e))?;
        Self::from_seed_json(&raw)
    }

    pub fn from_seed_json(raw: &str) -> Result<Self, anyhow::Error> {
        let users: Vec<SeedUser> = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Invalid directory seed: {}", e))?;

        let directory = Self::new();
        for user in users {
            directory.insert_user(user.user_id, &user.username, user.password_hash, user.roles);
        }
        tracing::info!(users = directory.credentials.len(), "Identity directory seeded");
        Ok(directory)
    }

    pub fn insert_user(&self, user_id: i64, username: &str, password_hash: String, roles: Vec<Role>) {
        self.credentials.insert(
            username.to_string(),
            Credentials {
                user_id,
                password_hash,
            },
        );
        self.roles.insert(user_id, roles);
    }

    /// Replace a user's roles, as the role CRUD layer would.
    pub fn set_roles(&self, user_id: i64, roles: Vec<Role>) {
        self.roles.insert(user_id, roles);
    }
}

#[async_trait]
impl RoleLookup for InMemoryDirectory {
    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, anyhow::Error> {
        Ok(self
            .roles
            .get(&user_id)
            .map(|roles| roles.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CredentialLookup for InMemoryDirectory {
    async fn credentials_for(&self, username: &str) -> Result<Option<Credentials>, anyhow::Error> {
        Ok(self.credentials.get(username).map(|c| c.clone()))
    }
}
