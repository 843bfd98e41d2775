use service_core::error::AppError;
use thiserror::Error;

/// Failures of the session store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Key not found or expired")]
    NotFound,

    #[error("Store call timed out after {0} ms")]
    Timeout(u64),

    #[error("Store unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(anyhow::Error::new(err))
    }
}

/// Failures of token issuance, session bookkeeping and authorization.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Token signing failed: {0}")]
    SigningError(String),

    #[error("Missing or malformed bearer credential")]
    MalformedCredential,

    #[error("Token signature or algorithm rejected")]
    InvalidSignature,

    #[error("Token claims expired or malformed")]
    ExpiredOrMalformedClaims,

    #[error("Refresh token is unknown, expired or already used")]
    InvalidRefreshToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SessionError {
    /// Map a store failure where a missing key means `missing`.
    pub(crate) fn from_store(err: StoreError, missing: SessionError) -> Self {
        match err {
            StoreError::NotFound => missing,
            StoreError::Timeout(ms) => {
                SessionError::StoreUnavailable(anyhow::anyhow!("store call timed out after {} ms", ms))
            }
            StoreError::Unavailable(e) => SessionError::StoreUnavailable(e),
        }
    }

    /// Failure class reported on the `outcome` metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            SessionError::Forbidden => "forbidden",
            SessionError::StoreUnavailable(_) | SessionError::SigningError(_) | SessionError::Internal(_) => {
                "error"
            }
            _ => "unauthorized",
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            // Token and claim failures all look the same from outside.
            SessionError::MalformedCredential
            | SessionError::InvalidSignature
            | SessionError::ExpiredOrMalformedClaims
            | SessionError::InvalidRefreshToken
            | SessionError::Unauthorized => AppError::Unauthorized(anyhow::anyhow!("Unauthorized")),
            SessionError::Forbidden => AppError::Forbidden(anyhow::anyhow!("Forbidden")),
            SessionError::SigningError(e) => AppError::InternalError(anyhow::anyhow!("Token signing failed: {}", e)),
            SessionError::StoreUnavailable(e) => AppError::InternalError(e.context("Session store unavailable")),
            SessionError::Internal(e) => AppError::InternalError(e),
        }
    }
}
