//! HTTP handlers.
//!
//! Successful responses are wrapped as `{"success": true, "data": ...}`.

pub mod ai;
pub mod health;
pub mod notes;
pub mod profile;
pub mod tasks;

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Success wrapper shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Body of delete responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Pagination metadata for list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    /// Total matching items across all pages
    pub total: i64,
    /// True if more items are available after this page
    pub has_more: bool,
}

impl Pagination {
    pub fn new(limit: i64, offset: i64, total: i64) -> Self {
        Self {
            limit,
            offset,
            total,
            has_more: offset + limit < total,
        }
    }
}
