use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub jwt: JwtConfig,
    pub directory: DirectoryConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: SecretString,
    pub refresh_secret: SecretString,
    /// Shared by access and refresh tokens.
    pub token_lifetime_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = SessionConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("session-auth"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            store: StoreConfig {
                backend: get_env("SESSION_STORE", Some("redis"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                redis_url: get_env("REDIS_URL", Some("redis://127.0.0.1:6379"), is_prod)?,
                timeout_ms: parse_env("REDIS_TIMEOUT_MS", "2000", is_prod)?,
            },
            jwt: JwtConfig {
                access_secret: SecretString::new(get_env("JWT_ACCESS_SECRET", None, is_prod)?),
                refresh_secret: SecretString::new(get_env("JWT_REFRESH_SECRET", None, is_prod)?),
                token_lifetime_minutes: parse_env("TOKEN_LIFETIME_MINUTES", "15", is_prod)?,
            },
            directory: DirectoryConfig {
                seed_path: env::var("DIRECTORY_SEED_PATH")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.token_lifetime_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_LIFETIME_MINUTES must be positive"
            )));
        }

        let access = self.jwt.access_secret.expose_secret();
        let refresh = self.jwt.refresh_secret.expose_secret();
        if access.is_empty() || refresh.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must not be empty"
            )));
        }
        if access == refresh {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ"
            )));
        }

        if self.store.timeout_ms == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REDIS_TIMEOUT_MS must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.store.backend == StoreBackend::Memory {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "In-memory session store is not allowed in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid session store backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SessionConfig {
        SessionConfig {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "session-auth".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            store: StoreConfig {
                backend: StoreBackend::Memory,
                redis_url: "redis://127.0.0.1:6379".to_string(),
                timeout_ms: 2000,
            },
            jwt: JwtConfig {
                access_secret: SecretString::new("access-secret".to_string()),
                refresh_secret: SecretString::new("refresh-secret".to_string()),
                token_lifetime_minutes: 15,
            },
            directory: DirectoryConfig { seed_path: None },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let mut config = valid_config();
        config.jwt.refresh_secret = SecretString::new("access-secret".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        let mut config = valid_config();
        config.jwt.token_lifetime_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_memory_store_rejected_in_prod() {
        let mut config = valid_config();
        config.environment = Environment::Prod;
        assert!(config.validate().is_err());

        config.store.backend = StoreBackend::Redis;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Redis".parse::<StoreBackend>(), Ok(StoreBackend::Redis));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("etcd".parse::<StoreBackend>().is_err());
    }
}
