use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Secret placeholder used in development when `JWT_SECRET` is unset.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone)]
pub struct BlogConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub verification: VerificationConfig,
    pub uploads: UploadConfig,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
    pub smtp: Option<SmtpConfig>,
    pub swagger_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!("Invalid ENVIRONMENT '{}': expected dev or prod", other)),
        }
    }
}

/// String that never shows up in `Debug` output.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub expiry_hours: i64,
}

impl JwtConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.secret.expose() == DEFAULT_JWT_SECRET
    }
}

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub code_ttl_minutes: i64,
    /// Return generated codes in API responses. Development only.
    pub expose_dev_codes: bool,
    pub reap_interval_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: String,
    pub max_file_mb: u64,
    pub body_limit_bytes: usize,
}

impl UploadConfig {
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub auth_attempts: u32,
    pub auth_window_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub from: String,
}

impl BlogConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Missing required environment variable: JWT_SECRET"
                )));
            }
            _ => DEFAULT_JWT_SECRET.to_string(),
        };

        let smtp = match optional_env("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_env("SMTP_PORT", "587", is_prod)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: SecretString::new(get_env("SMTP_PASS", Some(""), is_prod)?),
                from: get_env("SMTP_FROM", Some("noreply@blog.local"), is_prod)?,
            }),
            None => None,
        };

        let config = BlogConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("blog-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: optional_env("OTEL_EXPORTER_OTLP_ENDPOINT"),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", Some("postgres://localhost/blog"), is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            jwt: JwtConfig {
                secret: SecretString::new(jwt_secret),
                expiry_hours: parse_env("JWT_EXPIRY_HOURS", "72", is_prod)?,
            },
            verification: VerificationConfig {
                code_ttl_minutes: parse_env("VERIFICATION_CODE_TTL_MINUTES", "15", is_prod)?,
                expose_dev_codes: parse_env("EXPOSE_DEV_CODES", "false", is_prod)?,
                reap_interval_seconds: parse_env("VERIFICATION_REAP_INTERVAL_SECONDS", "600", is_prod)?,
            },
            uploads: UploadConfig {
                dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
                max_file_mb: parse_env("MAX_UPLOAD_MB", "50", is_prod)?,
                body_limit_bytes: parse_env("BODY_LIMIT_BYTES", "33554432", is_prod)?,
            },
            rate_limit: RateLimitConfig {
                auth_attempts: parse_env("AUTH_RATE_LIMIT", "10", is_prod)?,
                auth_window_seconds: parse_env("AUTH_RATE_WINDOW_SECONDS", "60", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("CORS_ORIGINS", Some("*"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            smtp,
            swagger_enabled: parse_env("ENABLE_SWAGGER", "true", is_prod)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Cross-field checks that individual variables cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        let is_prod = self.environment == Environment::Prod;

        if is_prod && self.jwt.uses_default_secret() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be changed from the default in production"
            )));
        }

        if is_prod && self.verification.expose_dev_codes {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "EXPOSE_DEV_CODES cannot be enabled in production"
            )));
        }

        if self.smtp.is_none() && !self.verification.expose_dev_codes {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "No verification code delivery configured: set SMTP_HOST, or EXPOSE_DEV_CODES=true for local development"
            )));
        }

        if is_prod && self.security.allowed_origins.iter().any(|o| o == "*") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CORS_ORIGINS must list explicit origins in production"
            )));
        }

        if self.jwt.expiry_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_HOURS must be positive"
            )));
        }

        if self.verification.code_ttl_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "VERIFICATION_CODE_TTL_MINUTES must be positive"
            )));
        }

        Ok(())
    }

    pub fn is_dev(&self) -> bool {
        self.environment == Environment::Dev
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if let Some(def) = default {
                if is_prod {
                    tracing::debug!("{} not set, using default", key);
                }
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "Missing required environment variable: {}",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = get_env(key, Some(default), is_prod)?;
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
    })
}
