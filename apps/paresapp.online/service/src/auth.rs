use std::collections::HashMap;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use pares_domain::seed::{DemoDataset, demo_dataset};
use pares_domain::{User, UserType};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::marketplace_store::{MarketplaceStore, MarketplaceStoreError, NewAccount};
use crate::session_token::{IssuedToken, SessionTokenError, SessionTokenIssuer};

const INVALID_CREDENTIALS: &str = "Invalid email or password.";
const INACTIVE_ACCOUNT: &str = "This account has been deactivated.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("{message}")]
    Forbidden { message: String },
    #[error("{message}")]
    Conflict { message: String },
    #[error("{message}")]
    Internal { message: String },
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::Conflict { .. } => "conflict",
            Self::Internal { .. } => "internal",
        }
    }

    fn validation(field: &'static str, message: &str) -> Self {
        Self::Validation {
            field,
            message: message.to_string(),
        }
    }

    fn unauthorized(message: &str) -> Self {
        Self::Unauthorized {
            message: message.to_string(),
        }
    }
}

impl From<SessionTokenError> for AuthError {
    fn from(error: SessionTokenError) -> Self {
        match error {
            SessionTokenError::Expired => Self::unauthorized("Session expired."),
            SessionTokenError::Invalid => Self::unauthorized("Invalid session token."),
            SessionTokenError::Signing { message } => Self::Internal { message },
        }
    }
}

impl From<MarketplaceStoreError> for AuthError {
    fn from(error: MarketplaceStoreError) -> Self {
        match error {
            MarketplaceStoreError::Conflict { message } => Self::Conflict { message },
            MarketplaceStoreError::Validation { field, message } => {
                Self::Validation { field, message }
            }
            MarketplaceStoreError::NotFound { .. } => {
                Self::unauthorized("Account no longer exists.")
            }
        }
    }
}

/// Argon2id hashing with configurable cost.
#[derive(Clone)]
pub struct PasswordHashing {
    params: Params,
}

impl PasswordHashing {
    pub fn from_config(config: &Config) -> Self {
        let params = Params::new(
            config.password_hash_memory_kib,
            config.password_hash_iterations,
            1,
            None,
        )
        .unwrap_or_else(|error| {
            tracing::warn!(%error, "invalid password hash parameters; using defaults");
            Params::default()
        });
        Self { params }
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(|error| {
            AuthError::Internal {
                message: format!("failed to build password salt: {error}"),
            }
        })?;
        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AuthError::Internal {
                message: format!("failed to hash password: {error}"),
            })
    }

    /// Parameters are read back from the PHC string, so hashes made under an
    /// older cost setting still verify.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AuthService {
    store: MarketplaceStore,
    tokens: SessionTokenIssuer,
    hashing: PasswordHashing,
    password_min_length: usize,
}

impl AuthService {
    pub fn from_config(config: &Config, store: MarketplaceStore) -> Self {
        Self {
            store,
            tokens: SessionTokenIssuer::from_config(config),
            hashing: PasswordHashing::from_config(config),
            password_min_length: config.password_min_length,
        }
    }

    pub fn cookie_max_age_seconds(&self) -> u64 {
        self.tokens.ttl_seconds()
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthenticatedSession, AuthError> {
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(AuthError::validation("email", "Email is required."));
        }
        if request.password.is_empty() {
            return Err(AuthError::validation("password", "Password is required."));
        }

        let Some((user, hash)) = self.store.credentials_for_email(&email).await else {
            return Err(AuthError::unauthorized(INVALID_CREDENTIALS));
        };
        if !self.hashing.verify(&request.password, &hash) {
            return Err(AuthError::unauthorized(INVALID_CREDENTIALS));
        }
        if !user.is_active {
            return Err(AuthError::Forbidden {
                message: INACTIVE_ACCOUNT.to_string(),
            });
        }

        let token = self.tokens.issue(&user)?;
        Ok(AuthenticatedSession { user, token })
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<AuthenticatedSession, AuthError> {
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(AuthError::validation("email", "Email is required."));
        }
        if !looks_like_email(&email) {
            return Err(AuthError::validation(
                "email",
                "Enter a valid email address.",
            ));
        }
        if request.password.chars().count() < self.password_min_length {
            return Err(AuthError::Validation {
                field: "password",
                message: format!(
                    "Password must be at least {} characters.",
                    self.password_min_length
                ),
            });
        }
        let first_name = request.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err(AuthError::validation("firstName", "First name is required."));
        }
        let last_name = request.last_name.trim().to_string();
        if last_name.is_empty() {
            return Err(AuthError::validation("lastName", "Last name is required."));
        }
        let user_type = match request.user_type.as_deref().map(str::trim) {
            None | Some("") => UserType::Customer,
            Some(raw) => match UserType::parse(raw) {
                Some(UserType::Admin) => {
                    return Err(AuthError::validation(
                        "userType",
                        "Admin accounts cannot be self-registered.",
                    ));
                }
                Some(user_type) => user_type,
                None => {
                    return Err(AuthError::validation(
                        "userType",
                        "User type must be customer or service_provider.",
                    ));
                }
            },
        };

        let password_hash = self.hashing.hash(&request.password)?;
        let user = self
            .store
            .register_account(NewAccount {
                email,
                password_hash,
                first_name,
                last_name,
                user_type,
                phone: request
                    .phone
                    .map(|phone| phone.trim().to_string())
                    .filter(|phone| !phone.is_empty()),
            })
            .await?;

        let token = self.tokens.issue(&user)?;
        Ok(AuthenticatedSession { user, token })
    }

    /// Verifies the token and re-reads the account so profile edits and
    /// deactivation take effect before the token expires.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        Ok(self.store.user(&claims.sub).await?)
    }

    /// Issues a session for an existing account without a password check.
    pub async fn issue_for_email(&self, email: &str) -> Result<AuthenticatedSession, AuthError> {
        let user = self
            .store
            .user_by_email(email)
            .await
            .ok_or_else(|| AuthError::unauthorized("No account with that email."))?;
        let token = self.tokens.issue(&user)?;
        Ok(AuthenticatedSession { user, token })
    }
}

/// Builds the demo store, hashing each seeded password once at boot.
pub fn seeded_store(hashing: &PasswordHashing, now: DateTime<Utc>) -> MarketplaceStore {
    let dataset: DemoDataset = demo_dataset(now);
    let mut hashes: HashMap<String, String> = HashMap::new();
    let mut credentials = HashMap::new();

    for account in &dataset.accounts {
        let hash = match hashes.get(&account.password) {
            Some(hash) => hash.clone(),
            None => match hashing.hash(&account.password) {
                Ok(hash) => {
                    hashes.insert(account.password.clone(), hash.clone());
                    hash
                }
                Err(error) => {
                    tracing::error!(email = %account.user.email, %error, "failed to hash demo password");
                    continue;
                }
            },
        };
        credentials.insert(account.user.id.clone(), hash);
    }

    MarketplaceStore::from_dataset(dataset, credentials)
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
