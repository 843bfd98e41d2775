use service_core::{
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    error::AppError,
};

use crate::{
    models::Requirement,
    services::{metrics, AuthSession, SessionError},
};

/// Check the session's roles against `requirement`.
pub fn authorize(auth: &AuthSession, requirement: &Requirement) -> Result<(), SessionError> {
    if requirement.is_satisfied_by(&auth.session.roles) {
        metrics::record("authorize", "ok");
        return Ok(());
    }

    tracing::warn!(
        user_id = auth.user_id,
        access_id = %auth.access_id,
        required = ?requirement,
        "Insufficient capabilities"
    );
    metrics::record("authorize", "forbidden");
    Err(SessionError::Forbidden)
}

/// Layer after [`super::auth_middleware`]:
/// `from_fn_with_state(Requirement::all(&[..]), require_capabilities)`.
pub async fn require_capabilities(
    State(requirement): State<Requirement>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = req.extensions().get::<AuthSession>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Auth session missing from request extensions"
        ))
    })?;

    authorize(auth, &requirement)?;

    Ok(next.run(req).await)
}
