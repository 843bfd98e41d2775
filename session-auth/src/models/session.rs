//! Server-side session records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Session stored under `session:{access_id}`.
///
/// `refresh_id` points at the refresh record minted in the same login; both
/// records carry their own TTL in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub refresh_id: Uuid,
    pub roles: Vec<Role>,
}

impl Session {
    pub fn new(user_id: i64, refresh_id: Uuid, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            refresh_id,
            roles,
        }
    }
}
