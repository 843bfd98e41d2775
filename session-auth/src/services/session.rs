//! Login, refresh, logout and per-request authentication over the session store.
//!
//! Each login writes two keys, `session:{access_id}` then
//! `refresh:{refresh_id}`, and each logout deletes them in the same order.
//! Neither pair of store calls is atomic. A failure between them leaves a
//! half that expires on its own TTL; nothing is compensated here.

use chrono::{DateTime, Utc};
use service_core::axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Role, Session};
use crate::services::{
    metrics,
    store::{refresh_key, session_key},
    JwtService, RoleLookup, SessionError, SessionStore, TokenPair,
};

#[derive(Clone)]
pub struct SessionService {
    jwt: JwtService,
    store: Arc<dyn SessionStore>,
    roles: Arc<dyn RoleLookup>,
}

/// Outcome of a successful [`SessionService::authenticate`].
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
    pub access_id: Uuid,
    pub session: Session,
}

impl SessionService {
    pub fn new(jwt: JwtService, store: Arc<dyn SessionStore>, roles: Arc<dyn RoleLookup>) -> Self {
        Self { jwt, store, roles }
    }

    /// Issue a token pair for `user_id` and persist its session and refresh records.
    pub async fn login(&self, user_id: i64, roles: Vec<Role>) -> Result<TokenPair, SessionError> {
        let result = self.create_session(user_id, roles).await;
        observe("login", &result);
        result
    }

    /// Verify the bearer token in `headers` and load its live session.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthSession, SessionError> {
        let result = self.authenticate_inner(headers).await;
        observe("authenticate", &result);
        result
    }

    /// Exchange a refresh token for a new pair. The refresh record is consumed.
    ///
    /// The access session minted alongside the consumed refresh token is left
    /// in place until it expires or is logged out.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let result = self.refresh_inner(refresh_token).await;
        observe("refresh", &result);
        result
    }

    /// Revoke the session behind `access_id` and its paired refresh record.
    pub async fn logout(&self, access_id: Uuid) -> Result<(), SessionError> {
        let result = self.logout_inner(access_id).await;
        observe("logout", &result);
        result
    }

    /// Load the session stored for `access_id`.
    pub async fn session(&self, access_id: &Uuid) -> Result<Session, SessionError> {
        let raw = self
            .store
            .get(&session_key(access_id))
            .await
            .map_err(|e| SessionError::from_store(e, SessionError::Unauthorized))?;

        serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(access_id = %access_id, error = %e, "Stored session is not valid JSON");
            SessionError::Unauthorized
        })
    }

    async fn create_session(&self, user_id: i64, roles: Vec<Role>) -> Result<TokenPair, SessionError> {
        let pair = self.jwt.issue_token_pair(user_id)?;
        let session = Session::new(user_id, pair.refresh_id, roles);

        let session_json = serde_json::to_string(&session)
            .map_err(|e| SessionError::Internal(anyhow::anyhow!("Failed to encode session: {}", e)))?;

        self.store
            .put(
                &session_key(&pair.access_id),
                &session_json,
                ttl_until(pair.access_expires_at),
            )
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "Failed to persist access session");
                SessionError::from_store(e, SessionError::Unauthorized)
            })?;

        self.store
            .put(
                &refresh_key(&pair.refresh_id),
                &user_id.to_string(),
                ttl_until(pair.refresh_expires_at),
            )
            .await
            .map_err(|e| {
                // The access session written above stays until its TTL runs out.
                tracing::error!(
                    user_id,
                    access_id = %pair.access_id,
                    error = %e,
                    "Failed to persist refresh record after access session"
                );
                SessionError::from_store(e, SessionError::Unauthorized)
            })?;

        tracing::info!(user_id, access_id = %pair.access_id, "Session created");
        Ok(pair)
    }

    async fn authenticate_inner(&self, headers: &HeaderMap) -> Result<AuthSession, SessionError> {
        let claims = self.jwt.extract_access_claims(headers)?;
        if !claims.authorized {
            return Err(SessionError::Unauthorized);
        }

        let session = self.session(&claims.access_id).await?;

        if session.user_id != claims.user_id {
            tracing::warn!(
                access_id = %claims.access_id,
                claim_user_id = claims.user_id,
                session_user_id = session.user_id,
                "Access token user does not match stored session"
            );
            return Err(SessionError::Unauthorized);
        }

        Ok(AuthSession {
            user_id: claims.user_id,
            access_id: claims.access_id,
            session,
        })
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = self.jwt.extract_refresh_claims(refresh_token)?;

        let stored = self
            .store
            .take(&refresh_key(&claims.refresh_id))
            .await
            .map_err(|e| {
                if matches!(e, super::StoreError::NotFound) {
                    tracing::warn!(
                        user_id = claims.user_id,
                        refresh_id = %claims.refresh_id,
                        "Refresh token unknown, expired or already used"
                    );
                }
                SessionError::from_store(e, SessionError::InvalidRefreshToken)
            })?;

        let user_id: i64 = stored.parse().map_err(|_| {
            tracing::error!(refresh_id = %claims.refresh_id, "Stored refresh record is not a user id");
            SessionError::InvalidRefreshToken
        })?;

        if user_id != claims.user_id {
            tracing::warn!(
                refresh_id = %claims.refresh_id,
                claim_user_id = claims.user_id,
                stored_user_id = user_id,
                "Refresh token user does not match stored record"
            );
            return Err(SessionError::InvalidRefreshToken);
        }

        let roles = self.roles.roles_for_user(user_id).await.map_err(|e| {
            tracing::error!(user_id, error = %e, "Failed to load roles during refresh");
            SessionError::Internal(e)
        })?;

        let pair = self.create_session(user_id, roles).await?;
        tracing::info!(user_id, "Token pair refreshed");
        Ok(pair)
    }

    async fn logout_inner(&self, access_id: Uuid) -> Result<(), SessionError> {
        let session = self.session(&access_id).await?;

        self.store
            .delete(&session_key(&access_id))
            .await
            .map_err(|e| SessionError::from_store(e, SessionError::Unauthorized))?;

        // A failure here leaves an orphaned refresh record behind; it lapses with its TTL.
        self.store
            .delete(&refresh_key(&session.refresh_id))
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = session.user_id,
                    refresh_id = %session.refresh_id,
                    error = %e,
                    "Failed to delete refresh record after session"
                );
                SessionError::from_store(e, SessionError::Unauthorized)
            })?;

        tracing::info!(user_id = session.user_id, access_id = %access_id, "Session revoked");
        Ok(())
    }
}

/// Whole seconds until `expires_at`, never less than one.
fn ttl_until(expires_at: DateTime<Utc>) -> u64 {
    (expires_at - Utc::now()).num_seconds().max(1) as u64
}

fn observe<T>(event: &str, result: &Result<T, SessionError>) {
    match result {
        Ok(_) => metrics::record(event, "ok"),
        Err(e) => metrics::record(event, e.outcome()),
    }
}
