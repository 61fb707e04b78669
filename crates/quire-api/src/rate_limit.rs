//! Per-client-IP request quotas.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use quire_core::{Error, Result};

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::AppState;

/// Which quota a route draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    General,
    Ai,
}

impl LimitScope {
    fn code(self) -> &'static str {
        match self {
            LimitScope::General => "RATE_LIMIT_EXCEEDED",
            LimitScope::Ai => "AI_RATE_LIMIT_EXCEEDED",
        }
    }
}

/// Keyed limiters for the general API and the AI action route.
pub struct RateLimits {
    general: DefaultKeyedRateLimiter<IpAddr>,
    ai: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        Ok(Self {
            general: RateLimiter::keyed(quota(config.requests, config)?),
            ai: RateLimiter::keyed(quota(config.ai_requests, config)?),
            clock: DefaultClock::default(),
        })
    }

    /// Take one cell for `ip`; on rejection, the wait in whole seconds.
    pub fn check(&self, scope: LimitScope, ip: IpAddr) -> std::result::Result<(), u64> {
        let limiter = match scope {
            LimitScope::General => &self.general,
            LimitScope::Ai => &self.ai,
        };
        limiter.check_key(&ip).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
        })
    }

    /// Drop state for clients whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.general.retain_recent();
        self.ai.retain_recent();
    }
}

/// `requests` per `period`, replenished evenly, full burst available.
fn quota(requests: u32, config: &RateLimitConfig) -> Result<Quota> {
    let burst = NonZeroU32::new(requests)
        .ok_or_else(|| Error::Config("Rate limit must be non-zero".into()))?;
    let quota = Quota::with_period(config.period / requests)
        .ok_or_else(|| Error::Config("Rate limit period must be non-zero".into()))?;
    Ok(quota.allow_burst(burst))
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

async fn enforce(
    state: &AppState,
    scope: LimitScope,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    if let Some(limits) = &state.rate_limits {
        let ip = client_ip(&request);
        if let Err(retry_after_secs) = limits.check(scope, ip) {
            warn!(
                subsystem = "api",
                component = "rate_limit",
                client_ip = %ip,
                code = scope.code(),
                retry_after_secs,
                "Rate limit exceeded"
            );
            return Err(ApiError::RateLimited {
                code: scope.code(),
                retry_after_secs,
            });
        }
    }
    Ok(next.run(request).await)
}

pub async fn limit_general(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    enforce(&state, LimitScope::General, request, next).await
}

pub async fn limit_ai(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    enforce(&state, LimitScope::Ai, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limits(requests: u32, ai_requests: u32) -> RateLimits {
        RateLimits::new(&RateLimitConfig {
            enabled: true,
            requests,
            ai_requests,
            period: Duration::from_secs(900),
        })
        .unwrap()
    }

    #[test]
    fn test_burst_then_reject() {
        let limits = limits(3, 1);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        for _ in 0..3 {
            assert!(limits.check(LimitScope::General, ip).is_ok());
        }
        let wait = limits.check(LimitScope::General, ip).unwrap_err();
        assert!(wait > 0 && wait <= 300);
    }

    #[test]
    fn test_clients_are_independent() {
        let limits = limits(1, 1);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limits.check(LimitScope::General, a).is_ok());
        assert!(limits.check(LimitScope::General, a).is_err());
        assert!(limits.check(LimitScope::General, b).is_ok());
    }

    #[test]
    fn test_scopes_are_independent() {
        let limits = limits(5, 1);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(limits.check(LimitScope::Ai, ip).is_ok());
        assert!(limits.check(LimitScope::Ai, ip).is_err());
        assert!(limits.check(LimitScope::General, ip).is_ok());
    }

    #[test]
    fn test_scope_codes() {
        assert_eq!(LimitScope::General.code(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(LimitScope::Ai.code(), "AI_RATE_LIMIT_EXCEEDED");
    }
}
