//! # quire-api
//!
//! axum HTTP server for quire: note and task CRUD, profiles, and AI actions
//! on notes. The binary in `main.rs` wires Postgres and the hosted model into
//! [`AppState`] and serves [`build_router`].

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod rate_limit;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method, Uri};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use quire_core::{
    AiRunRepository, NoteRepository, ProfileRepository, Result, TaskRepository,
};
use quire_inference::AiPipeline;

use crate::auth::{JwtVerifier, TOKEN_EXPIRES_IN_HEADER, TOKEN_REFRESH_NEEDED_HEADER};
use crate::config::{HttpConfig, JwtConfig, RateLimitConfig};
use crate::error::ApiError;
use crate::handlers::{ai, health, notes, profile, tasks};
use crate::openapi::ApiDoc;
use crate::rate_limit::RateLimits;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub ai_runs: Arc<dyn AiRunRepository>,
    /// `None` when no provider key is configured; AI routes then answer
    /// `AI_UNCONFIGURED`.
    pub ai: Option<AiPipeline>,
    pub auth: Arc<JwtVerifier>,
    /// `None` when rate limiting is disabled.
    pub rate_limits: Option<Arc<RateLimits>>,
}

impl AppState {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        tasks: Arc<dyn TaskRepository>,
        profiles: Arc<dyn ProfileRepository>,
        ai_runs: Arc<dyn AiRunRepository>,
        jwt: &JwtConfig,
    ) -> Self {
        Self {
            notes,
            tasks,
            profiles,
            ai_runs,
            ai: None,
            auth: Arc::new(JwtVerifier::new(jwt)),
            rate_limits: None,
        }
    }

    pub fn with_ai(mut self, pipeline: AiPipeline) -> Self {
        self.ai = Some(pipeline);
        self
    }

    pub fn with_rate_limits(mut self, config: &RateLimitConfig) -> Result<Self> {
        self.rate_limits = if config.enabled {
            Some(Arc::new(RateLimits::new(config)?))
        } else {
            None
        };
        Ok(self)
    }
}

/// UUIDv7 request IDs, so IDs sort by arrival time in logs.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(subsystem = "api", origin = %origin, error = %e, "Invalid CORS origin");
                None
            }
        })
        .collect()
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_allowed_origins(
            &http.allowed_origins,
        )))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(TOKEN_REFRESH_NEEDED_HEADER),
            HeaderName::from_static(TOKEN_EXPIRES_IN_HEADER),
            header::RETRY_AFTER,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::route_not_found(method.as_str(), uri.path())
}

/// Build the full router.
///
/// Serve with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// rate limiter can key on the client address.
pub fn build_router(state: AppState, http: &HttpConfig) -> Router {
    let ai_action = Router::new()
        .route("/api/notes/:id/ai", post(ai::run_action))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::limit_ai));

    let api = Router::new()
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/api/notes/:id/ai-history", get(ai::ai_history))
        .merge(ai_action)
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/:id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route_layer(from_fn_with_state(state.clone(), auth::require_auth))
        .route_layer(from_fn_with_state(state.clone(), rate_limit::limit_general));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(http))
        .layer(RequestBodyLimitLayer::new(http.max_body_bytes))
        .with_state(state)
}
