use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use pares_domain::{User, UserType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Claims carried by the `auth-token` session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub user_type: UserType,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub max_age_seconds: u64,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("session token expired")]
    Expired,
    #[error("invalid session token")]
    Invalid,
    #[error("failed to sign session token: {message}")]
    Signing { message: String },
}

#[derive(Clone)]
pub struct SessionTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl SessionTokenIssuer {
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.jwt_ttl_seconds)
    }

    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, SessionTokenError> {
        let issued_at = Utc::now();
        let ttl = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX / 2);
        let expires_at = issued_at + Duration::seconds(ttl);
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            user_type: user.user_type,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: user.is_active,
            phone: user.phone.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: format!("sess_{}", Uuid::new_v4().simple()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |error| SessionTokenError::Signing {
                message: error.to_string(),
            },
        )?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
            max_age_seconds: self.ttl_seconds,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        decode::<SessionClaims>(token.trim(), &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

/// Token from an `Authorization: Bearer <jwt>` header value.
pub fn extract_bearer_token(header_value: Option<&str>) -> Option<&str> {
    let token = header_value?.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> SessionTokenError {
    match error.kind() {
        ErrorKind::ExpiredSignature => SessionTokenError::Expired,
        _ => SessionTokenError::Invalid,
    }
}
