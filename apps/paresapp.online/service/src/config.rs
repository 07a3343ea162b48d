use std::env;
use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_LOG_JSON: bool = false;
pub(crate) const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";
const DEFAULT_JWT_TTL_SECONDS: u64 = 604_800;
const DEFAULT_AUTH_COOKIE_NAME: &str = "auth-token";
const DEFAULT_AUTH_COOKIE_SECURE: bool = false;
const DEFAULT_PASSWORD_MIN_LENGTH: usize = 6;
const DEFAULT_PASSWORD_HASH_MEMORY_KIB: u32 = 19_456;
const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 2;
const DEFAULT_SEED_DEMO_DATA: bool = true;
const DEFAULT_AUTH_THROTTLE_LIMIT: usize = 30;
const DEFAULT_AUTH_THROTTLE_WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub log_json: bool,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: u64,
    pub auth_cookie_name: String,
    pub auth_cookie_secure: bool,
    pub password_min_length: usize,
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
    pub seed_demo_data: bool,
    pub auth_throttle_limit: usize,
    pub auth_throttle_window_seconds: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PARES_BIND_ADDR value '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr_raw = env::var("PARES_BIND_ADDR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let bind_addr = bind_addr_raw
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: bind_addr_raw.clone(),
                source,
            })?;

        let log_filter = env::var("PARES_LOG_FILTER")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let log_json = env::var("PARES_LOG_JSON")
            .ok()
            .map(|value| parse_flag(&value))
            .unwrap_or(DEFAULT_LOG_JSON);

        let jwt_secret = env::var("PARES_JWT_SECRET")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());

        let jwt_ttl_seconds = env::var("PARES_JWT_TTL_SECONDS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_JWT_TTL_SECONDS);

        let auth_cookie_name = env::var("PARES_AUTH_COOKIE_NAME")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTH_COOKIE_NAME.to_string());

        let auth_cookie_secure = env::var("PARES_AUTH_COOKIE_SECURE")
            .ok()
            .map(|value| parse_flag(&value))
            .unwrap_or(DEFAULT_AUTH_COOKIE_SECURE);

        let password_min_length = env::var("PARES_PASSWORD_MIN_LENGTH")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_PASSWORD_MIN_LENGTH);

        let password_hash_memory_kib = env::var("PARES_PASSWORD_HASH_MEMORY_KIB")
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PASSWORD_HASH_MEMORY_KIB);

        let password_hash_iterations = env::var("PARES_PASSWORD_HASH_ITERATIONS")
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_PASSWORD_HASH_ITERATIONS);

        let seed_demo_data = env::var("PARES_SEED_DEMO_DATA")
            .ok()
            .map(|value| parse_flag(&value))
            .unwrap_or(DEFAULT_SEED_DEMO_DATA);

        let auth_throttle_limit = env::var("PARES_AUTH_THROTTLE_LIMIT")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_AUTH_THROTTLE_LIMIT);

        let auth_throttle_window_seconds = env::var("PARES_AUTH_THROTTLE_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_AUTH_THROTTLE_WINDOW_SECONDS);

        Ok(Self {
            bind_addr,
            log_filter,
            log_json,
            jwt_secret,
            jwt_ttl_seconds,
            auth_cookie_name,
            auth_cookie_secure,
            password_min_length,
            password_hash_memory_kib,
            password_hash_iterations,
            seed_demo_data,
            auth_throttle_limit,
            auth_throttle_window_seconds,
        })
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
impl Config {
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_filter: "debug".to_string(),
            log_json: false,
            jwt_secret: "pares-test-secret".to_string(),
            jwt_ttl_seconds: DEFAULT_JWT_TTL_SECONDS,
            auth_cookie_name: DEFAULT_AUTH_COOKIE_NAME.to_string(),
            auth_cookie_secure: false,
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            password_hash_memory_kib: 256,
            password_hash_iterations: 1,
            seed_demo_data: true,
            auth_throttle_limit: DEFAULT_AUTH_THROTTLE_LIMIT,
            auth_throttle_window_seconds: DEFAULT_AUTH_THROTTLE_WINDOW_SECONDS,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_flag};

    #[test]
    fn test_fixture_is_cheap_and_seeded() {
        let config = Config::for_tests();
        assert_eq!(config.bind_addr.port(), 0);
        assert_eq!(config.auth_cookie_name, "auth-token");
        assert!(config.seed_demo_data);
        assert!(!config.uses_default_jwt_secret());
        assert!(config.password_hash_memory_kib < 1024);
    }

    #[test]
    fn flags_accept_common_truthy_spellings() {
        for value in ["1", "true", " YES "] {
            assert!(parse_flag(value));
        }
        for value in ["0", "false", "no", ""] {
            assert!(!parse_flag(value));
        }
    }
}
