use service_core::{
    axum::{
        extract::{FromRequestParts, Request, State},
        http::request::Parts,
        middleware::Next,
        response::Response,
    },
    error::AppError,
};

use crate::{services::AuthSession, AppState};

/// Require a live session behind the bearer token.
///
/// Every token, claim and session failure is answered with the same 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = state.sessions.authenticate(req.headers()).await.map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Authentication failed");
        AppError::from(e)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthSession>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth session missing from request extensions"
            ))
        })
    }
}
