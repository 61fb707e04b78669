use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use quire_core::{Profile, UpdateProfileRequest};

use super::{ApiResult, Envelope};
use crate::auth::AuthUser;
use crate::error::ErrorBody;
use crate::extract::ApiJson;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileData {
    pub profile: Profile,
}

/// The caller's profile, created with defaults on first access.
#[utoipa::path(get, path = "/api/profile", tag = "Profile",
    responses((status = 200, description = "The caller's profile", body = ProfileData)))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<ProfileData>>> {
    let profile = state.profiles.fetch_or_create(user.id).await?;
    Ok(Envelope::ok(ProfileData { profile }))
}

#[utoipa::path(patch, path = "/api/profile", tag = "Profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = ProfileData),
        (status = 400, description = "Invalid update", body = ErrorBody),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<Envelope<ProfileData>>> {
    req.validate()?;
    let profile = state.profiles.update(user.id, req).await?;
    Ok(Envelope::ok(ProfileData { profile }))
}
