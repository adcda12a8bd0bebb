//! User profile endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use cyberguard_common::{AppResult, validation::mask_tail};
use cyberguard_core::UpdateProfileInput;
use cyberguard_db::entities::user::{self, UserRole};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// User response. Never carries the password hash or the full Aadhaar number.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    /// Last four digits visible.
    pub aadhaar_number: String,
    pub phone_number: String,
    pub address: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_id: Option<String>,
    pub is_verified: bool,
    pub has_password: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            aadhaar_number: mask_tail(&user.aadhaar_number),
            has_password: user.password_hash.is_some(),
            id: user.id,
            name: user.name,
            phone_number: user.phone_number,
            address: user.address,
            role: user.role,
            government_id: user.government_id,
            is_verified: user.is_verified,
            last_login_at: user.last_login_at.map(|t| t.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Get a profile: one's own, or anyone's for officials.
async fn show(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get_profile(&id, &viewer).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update one's own name or address.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.update_profile(user, input).await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", put(update))
        .route("/profile/{id}", get(show))
}
