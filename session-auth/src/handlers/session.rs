use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::session::{AuthorizeRequest, LoginRequest, RefreshRequest, SessionResponse, TokenResponse},
    middleware,
    services::AuthSession,
    utils::{verify_password, Password, PasswordHashString, ValidatedJson},
    AppState,
};

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
}

/// Exchange username and password for a token pair.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = state
        .credentials
        .credentials_for(&req.username)
        .await
        .map_err(|e| AppError::InternalError(e.context("Credential lookup failed")))?;

    let Some(credentials) = credentials else {
        tracing::warn!(username = %req.username, "Login attempt for unknown user");
        return Err(invalid_credentials());
    };

    let password = Password::new(req.password);
    let hash = PasswordHashString::new(credentials.password_hash);
    if verify_password(&password, &hash).is_err() {
        tracing::warn!(user_id = credentials.user_id, "Login attempt with wrong password");
        return Err(invalid_credentials());
    }

    let roles = state
        .roles
        .roles_for_user(credentials.user_id)
        .await
        .map_err(|e| AppError::InternalError(e.context("Role lookup failed")))?;

    let pair = state.sessions.login(credentials.user_id, roles).await?;
    Ok((StatusCode::OK, Json(TokenResponse::from(pair))))
}

/// Trade a refresh token for a new pair.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.sessions.refresh(&req.refresh_token).await?;
    Ok((StatusCode::OK, Json(TokenResponse::from(pair))))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.logout(auth.access_id).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}

/// Describe the caller's current session.
pub async fn session(auth: AuthSession) -> Json<SessionResponse> {
    Json(SessionResponse::from(&auth))
}

/// 204 when one of the session's roles satisfies the request, 403 otherwise.
pub async fn authorize(
    auth: AuthSession,
    ValidatedJson(req): ValidatedJson<AuthorizeRequest>,
) -> Result<StatusCode, AppError> {
    middleware::authorize(&auth, &req.requirement())?;
    Ok(StatusCode::NO_CONTENT)
}
