//! Configuration loading and validation.
//!
//! Values come from the process environment (binaries load `.env` first).
//! Loading stops at the first invalid value; unknown variables are ignored.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use meridian_observability::{LogFormat, LogSettings};

use crate::jobs::ProcessingConfig;

/// Which of the two services is being configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// service-a: user management.
    Users,
    /// service-b: product catalog and batch processing.
    Catalog,
}

impl ServiceKind {
    pub fn default_name(&self) -> &'static str {
        match self {
            ServiceKind::Users => "service-a",
            ServiceKind::Catalog => "service-b",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ServiceKind::Users => 3000,
            ServiceKind::Catalog => 3001,
        }
    }

    fn default_memory_limit_mb(&self) -> u64 {
        match self {
            ServiceKind::Users => 300,
            ServiceKind::Catalog => 150,
        }
    }

    fn default_readiness_memory_limit_mb(&self) -> u64 {
        match self {
            ServiceKind::Users => 500,
            ServiceKind::Catalog => 150,
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
    Staging,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
            Environment::Staging => "staging",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            "staging" => Ok(Self::Staging),
            other => Err(ConfigError::invalid(
                "APP_ENV",
                other,
                "expected one of development, production, test, staging",
            )),
        }
    }
}

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

/// Thresholds used by the health endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthThresholds {
    /// Process RSS limit for `/health`.
    pub memory_limit_bytes: u64,
    /// Process RSS limit for `/health/ready`.
    pub readiness_memory_limit_bytes: u64,
    /// Maximum used fraction of the root filesystem (0.0–1.0).
    pub disk_threshold: f64,
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason,
        }
    }
}

/// Full configuration of one service process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service: ServiceKind,
    pub service_name: String,
    pub version: String,
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
    pub cors_origins: CorsOrigins,
    pub health: HealthThresholds,
    pub processing: ProcessingConfig,
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env(service: ServiceKind) -> Result<Self, ConfigError> {
        Self::from_lookup(service, |key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(service: ServiceKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match var("APP_ENV").or_else(|| var("NODE_ENV")) {
            Some(v) => v.parse()?,
            None => Environment::default(),
        };

        let port = match var("PORT") {
            Some(v) => match v.parse::<u16>() {
                Ok(p) if p > 0 => p,
                _ => return Err(ConfigError::invalid("PORT", v, "expected a port number 1-65535")),
            },
            None => service.default_port(),
        };

        let log_level = match var("LOG_LEVEL") {
            Some(v) if LOG_LEVELS.contains(&v.to_ascii_lowercase().as_str()) => v.to_ascii_lowercase(),
            Some(v) => {
                return Err(ConfigError::invalid(
                    "LOG_LEVEL",
                    v,
                    "expected one of error, warn, info, debug, trace",
                ));
            }
            None => "info".to_string(),
        };

        let log_format = match var("LOG_FORMAT") {
            Some(v) => v
                .parse::<LogFormat>()
                .map_err(|_| ConfigError::invalid("LOG_FORMAT", v, "expected text or json"))?,
            None if environment.is_production() => LogFormat::Json,
            None => LogFormat::Text,
        };

        let cors_origins = match var("CORS_ORIGINS").or_else(|| var("CORS_ORIGIN")) {
            None => CorsOrigins::Any,
            Some(v) if v == "*" => CorsOrigins::Any,
            Some(v) => CorsOrigins::List(
                v.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };

        let memory_limit_mb = parse_positive(&var, "HEALTH_MEMORY_LIMIT_MB", service.default_memory_limit_mb())?;
        let readiness_memory_limit_mb = parse_positive(
            &var,
            "READINESS_MEMORY_LIMIT_MB",
            service.default_readiness_memory_limit_mb(),
        )?;
        let disk_threshold = match var("HEALTH_DISK_THRESHOLD") {
            Some(v) => match v.parse::<f64>() {
                Ok(t) if t > 0.0 && t <= 1.0 => t,
                _ => {
                    return Err(ConfigError::invalid(
                        "HEALTH_DISK_THRESHOLD",
                        v,
                        "expected a fraction in (0, 1]",
                    ));
                }
            },
            None => 0.9,
        };

        let service_name = var("OTEL_SERVICE_NAME").unwrap_or_else(|| service.default_name().to_string());

        let defaults = ProcessingConfig::default();
        let processing = ProcessingConfig {
            batch_size: parse_positive(&var, "BATCH_SIZE", defaults.batch_size as u64)? as usize,
            max_processing_time: Duration::from_millis(parse_positive(
                &var,
                "MAX_PROCESSING_TIME",
                defaults.max_processing_time.as_millis() as u64,
            )?),
            chunk_delay: match var("CHUNK_DELAY_MS") {
                Some(v) => Duration::from_millis(
                    v.parse::<u64>()
                        .map_err(|_| ConfigError::invalid("CHUNK_DELAY_MS", v, "expected milliseconds"))?,
                ),
                None => defaults.chunk_delay,
            },
            processed_by: service_name.clone(),
        };

        Ok(Self {
            service,
            service_name,
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level,
            log_format,
            log_file: var("LOG_FILE").map(PathBuf::from),
            cors_origins,
            health: HealthThresholds {
                memory_limit_bytes: memory_limit_mb * 1024 * 1024,
                readiness_memory_limit_bytes: readiness_memory_limit_mb * 1024 * 1024,
                disk_threshold,
            },
            processing,
        })
    }

    /// Logging settings derived from this configuration.
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level.clone(),
            format: self.log_format,
            file: self.log_file.clone(),
            service: self.service_name.clone(),
            environment: self.environment.as_str().to_string(),
        }
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_positive<F>(var: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::invalid(key, v, "expected a positive integer")),
        },
        None => Ok(default),
    }
}
