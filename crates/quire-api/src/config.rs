//! Server configuration read from the environment.

use std::time::Duration;

use quire_core::{defaults, Error, Result};

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 4000;

/// Default CORS origin (local web client).
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default request body limit: 10 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub http: HttpConfig,
    pub rate_limit: RateLimitConfig,
}

/// Token verification settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub audience: String,
    pub issuer: Option<String>,
}

/// Transport-level settings applied as router layers.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Per-IP quotas. Both limiters share one window length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u32,
    pub ai_requests: u32,
    pub period: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: defaults::RATE_LIMIT_REQUESTS,
            ai_requests: defaults::AI_RATE_LIMIT_REQUESTS,
            period: Duration::from_secs(defaults::RATE_LIMIT_PERIOD_SECS),
        }
    }
}

impl ApiConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            var("DATABASE_URL").ok_or_else(|| Error::Config("DATABASE_URL must be set".into()))?;
        let secret =
            var("JWT_SECRET").ok_or_else(|| Error::Config("JWT_SECRET must be set".into()))?;

        let rate_defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            enabled: parse_or("RATE_LIMIT_ENABLED", var("RATE_LIMIT_ENABLED"), true)?,
            requests: parse_or(
                "RATE_LIMIT_REQUESTS",
                var("RATE_LIMIT_REQUESTS"),
                rate_defaults.requests,
            )?,
            ai_requests: parse_or(
                "AI_RATE_LIMIT_REQUESTS",
                var("AI_RATE_LIMIT_REQUESTS"),
                rate_defaults.ai_requests,
            )?,
            period: Duration::from_secs(parse_or(
                "RATE_LIMIT_PERIOD_SECS",
                var("RATE_LIMIT_PERIOD_SECS"),
                defaults::RATE_LIMIT_PERIOD_SECS,
            )?),
        };
        if rate_limit.requests == 0 || rate_limit.ai_requests == 0 || rate_limit.period.is_zero() {
            return Err(Error::Config(
                "rate limit quotas and period must be greater than zero".into(),
            ));
        }

        let allowed_origins = var("ALLOWED_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_else(|| vec![DEFAULT_ALLOWED_ORIGIN.to_string()]);

        Ok(Self {
            database_url,
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", var("PORT"), DEFAULT_PORT)?,
            jwt: JwtConfig {
                secret,
                audience: var("JWT_AUDIENCE").unwrap_or_else(|| defaults::JWT_AUDIENCE.to_string()),
                issuer: var("JWT_ISSUER"),
            },
            http: HttpConfig {
                allowed_origins,
                max_body_bytes: parse_or(
                    "MAX_BODY_BYTES",
                    var("MAX_BODY_BYTES"),
                    DEFAULT_MAX_BODY_BYTES,
                )?,
            },
            rate_limit,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, value))),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
