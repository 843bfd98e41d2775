use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::services::SessionError;

const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Signs and verifies access/refresh tokens with two distinct HMAC secrets.
#[derive(Clone)]
pub struct JwtService {
    access_secret: SecretString,
    refresh_secret: SecretString,
    token_lifetime: Duration,
}

/// Claims carried by the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub authorized: bool,
    pub access_id: Uuid,
    pub user_id: i64,
    /// Expiry (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

/// Claims carried by the refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub refresh_id: Uuid,
    pub user_id: i64,
    /// Expiry (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

/// Freshly minted credentials. Only the ids and expiries are kept server-side.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_id: Uuid,
    pub refresh_id: Uuid,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(
            token_lifetime_minutes = config.token_lifetime_minutes,
            "JWT service initialized with HS256 secrets"
        );
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            token_lifetime: Duration::minutes(config.token_lifetime_minutes),
        }
    }

    pub fn from_secrets(access_secret: &str, refresh_secret: &str, token_lifetime: Duration) -> Self {
        Self {
            access_secret: SecretString::new(access_secret.to_string()),
            refresh_secret: SecretString::new(refresh_secret.to_string()),
            token_lifetime,
        }
    }

    /// Mint a new access/refresh pair for `user_id`.
    ///
    /// Both tokens currently share one expiry horizon.
    pub fn issue_token_pair(&self, user_id: i64) -> Result<TokenPair, SessionError> {
        let expires_at = Utc::now() + self.token_lifetime;
        let access_id = Uuid::new_v4();
        let refresh_id = Uuid::new_v4();

        let access_claims = AccessClaims {
            authorized: true,
            access_id,
            user_id,
            expires_at: expires_at.timestamp(),
        };
        let refresh_claims = RefreshClaims {
            refresh_id,
            user_id,
            expires_at: expires_at.timestamp(),
        };

        let access_token = sign(&access_claims, &self.access_secret, "access")?;
        let refresh_token = sign(&refresh_claims, &self.refresh_secret, "refresh")?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_id,
            refresh_id,
            access_expires_at: expires_at,
            refresh_expires_at: expires_at,
        })
    }

    /// Read the bearer credential from `headers` and verify it as an access token.
    pub fn extract_access_claims(&self, headers: &HeaderMap) -> Result<AccessClaims, SessionError> {
        let token = bearer_token(headers)?;
        self.decode_access_token(token)
    }

    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, SessionError> {
        verify(token, &self.access_secret)
    }

    /// Verify a refresh token taken from a request body.
    pub fn extract_refresh_claims(&self, token: &str) -> Result<RefreshClaims, SessionError> {
        verify(token, &self.refresh_secret)
    }
}

/// Extract `<token>` from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, SessionError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty() && !token.contains(' '))
        .ok_or(SessionError::MalformedCredential)
}

fn sign<T: Serialize>(claims: &T, secret: &SecretString, kind: &str) -> Result<String, SessionError> {
    let secret = secret.expose_secret();
    if secret.is_empty() {
        return Err(SessionError::SigningError(format!(
            "{} token secret is not configured",
            kind
        )));
    }

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| SessionError::SigningError(format!("Failed to encode {} token: {}", kind, e)))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &SecretString) -> Result<T, SessionError> {
    // Reject anything outside the HMAC family before touching the signature.
    let header = decode_header(token).map_err(|_| SessionError::InvalidSignature)?;
    if !HMAC_FAMILY.contains(&header.alg) {
        tracing::warn!(alg = ?header.alg, "Rejected token signed with unexpected algorithm");
        return Err(SessionError::InvalidSignature);
    }

    let secret = secret.expose_secret();
    if secret.is_empty() {
        return Err(SessionError::InvalidSignature);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = HMAC_FAMILY.to_vec();
    validation.leeway = 0;

    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => SessionError::ExpiredOrMalformedClaims,
            _ => SessionError::InvalidSignature,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use service_core::axum::http::HeaderValue;

    const ACCESS_SECRET: &str = "access-secret-for-tests";
    const REFRESH_SECRET: &str = "refresh-secret-for-tests";

    fn service() -> JwtService {
        JwtService::from_secrets(ACCESS_SECRET, REFRESH_SECRET, Duration::minutes(15))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    fn sign_raw(payload: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_extract_access_claims() {
        let service = service();
        let pair = service.issue_token_pair(42).unwrap();

        let claims = service.extract_access_claims(&bearer(&pair.access_token)).unwrap();
        assert!(claims.authorized);
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.access_id, pair.access_id);
        assert_eq!(claims.expires_at, pair.access_expires_at.timestamp());
    }

    #[test]
    fn test_issue_and_extract_refresh_claims() {
        let service = service();
        let pair = service.issue_token_pair(42).unwrap();

        let claims = service.extract_refresh_claims(&pair.refresh_token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.refresh_id, pair.refresh_id);
        assert_ne!(pair.access_id, pair.refresh_id);
    }

    #[test]
    fn test_access_and_refresh_share_expiry_horizon() {
        // Current behavior: one lifetime for both tokens.
        let pair = service().issue_token_pair(1).unwrap();
        assert_eq!(pair.access_expires_at, pair.refresh_expires_at);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let service = service();
        let pair = service.issue_token_pair(42).unwrap();

        assert!(matches!(
            service.extract_access_claims(&bearer(&pair.refresh_token)),
            Err(SessionError::InvalidSignature)
        ));
        assert!(matches!(
            service.extract_refresh_claims(&pair.access_token),
            Err(SessionError::InvalidSignature)
        ));
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let service = service();

        assert!(matches!(
            service.extract_access_claims(&HeaderMap::new()),
            Err(SessionError::MalformedCredential)
        ));

        for value in ["Basic abc", "Bearer", "Bearer ", "bearer abc", "Bearer a b"] {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
            assert!(
                matches!(
                    service.extract_access_claims(&headers),
                    Err(SessionError::MalformedCredential)
                ),
                "header {:?} should be rejected as malformed",
                value
            );
        }
    }

    #[test]
    fn test_garbage_token_fails_signature() {
        assert!(matches!(
            service().extract_access_claims(&bearer("not-a-jwt")),
            Err(SessionError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_secret_fails_signature() {
        let forged = JwtService::from_secrets("other", REFRESH_SECRET, Duration::minutes(15))
            .issue_token_pair(42)
            .unwrap();

        assert!(matches!(
            service().extract_access_claims(&bearer(&forged.access_token)),
            Err(SessionError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "authorized": true,
                "access_id": Uuid::new_v4(),
                "user_id": 1,
                "exp": Utc::now().timestamp() + 600,
            })
            .to_string(),
        );
        let token = format!("{}.{}.{}", header, payload, URL_SAFE_NO_PAD.encode("sig"));

        assert!(matches!(
            service().extract_access_claims(&bearer(&token)),
            Err(SessionError::InvalidSignature)
        ));

        let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let unsigned = format!("{}.{}.", none_header, payload);
        assert!(service().extract_access_claims(&bearer(&unsigned)).is_err());
    }

    #[test]
    fn test_expired_token_fails_claims() {
        let token = sign_raw(
            serde_json::json!({
                "authorized": true,
                "access_id": Uuid::new_v4(),
                "user_id": 9,
                "exp": Utc::now().timestamp() - 30,
            }),
            ACCESS_SECRET,
        );

        assert!(matches!(
            service().extract_access_claims(&bearer(&token)),
            Err(SessionError::ExpiredOrMalformedClaims)
        ));
    }

    #[test]
    fn test_missing_or_mistyped_claims() {
        let missing_user = sign_raw(
            serde_json::json!({
                "authorized": true,
                "access_id": Uuid::new_v4(),
                "exp": Utc::now().timestamp() + 600,
            }),
            ACCESS_SECRET,
        );
        assert!(matches!(
            service().extract_access_claims(&bearer(&missing_user)),
            Err(SessionError::ExpiredOrMalformedClaims)
        ));

        let mistyped_user = sign_raw(
            serde_json::json!({
                "refresh_id": Uuid::new_v4(),
                "user_id": "seven",
                "exp": Utc::now().timestamp() + 600,
            }),
            REFRESH_SECRET,
        );
        assert!(matches!(
            service().extract_refresh_claims(&mistyped_user),
            Err(SessionError::ExpiredOrMalformedClaims)
        ));

        let missing_exp = sign_raw(
            serde_json::json!({ "refresh_id": Uuid::new_v4(), "user_id": 3 }),
            REFRESH_SECRET,
        );
        assert!(matches!(
            service().extract_refresh_claims(&missing_exp),
            Err(SessionError::ExpiredOrMalformedClaims)
        ));
    }

    #[test]
    fn test_missing_secret_is_signing_error() {
        let service = JwtService::from_secrets("", REFRESH_SECRET, Duration::minutes(15));
        assert!(matches!(
            service.issue_token_pair(1),
            Err(SessionError::SigningError(_))
        ));
    }
}
