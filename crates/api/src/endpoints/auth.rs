//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use cyberguard_common::AppResult;
use cyberguard_core::{
    LoginInput, RegisterInput, ResetPasswordInput, Session, SetPasswordInput, VerifyOtpInput,
};
use cyberguard_db::entities::otp_challenge::OtpPurpose;
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use crate::{
    extractors::BearerToken,
    middleware::AppState,
    response::{Ack, ApiResponse, ack},
};

/// Register response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub requires_otp: bool,
    pub masked_phone: String,
}

/// Verify registration response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRegistrationResponse {
    pub user_id: String,
    pub requires_password: bool,
}

/// Resend OTP request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    pub user_id: String,
    #[serde(default = "default_purpose")]
    pub purpose: OtpPurpose,
}

const fn default_purpose() -> OtpPurpose {
    OtpPurpose::Registration
}

/// Forgot password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub user_id: String,
}

/// Where an OTP was sent.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSentResponse {
    pub user_id: String,
    pub masked_phone: String,
}

/// Session response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.user.into(),
            token: session.token,
        }
    }
}

/// Start a registration.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let outcome = state.auth_service.register(input).await?;

    Ok(ApiResponse::created(RegisterResponse {
        user_id: outcome.user_id,
        requires_otp: true,
        masked_phone: outcome.masked_phone,
    }))
}

/// Confirm the registration OTP.
async fn verify_registration(
    State(state): State<AppState>,
    Json(input): Json<VerifyOtpInput>,
) -> AppResult<ApiResponse<VerifyRegistrationResponse>> {
    let user = state.auth_service.verify_registration(input).await?;

    Ok(ApiResponse::ok(VerifyRegistrationResponse {
        user_id: user.id,
        requires_password: user.password_hash.is_none(),
    }))
}

/// Send a new OTP.
async fn resend_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOtpRequest>,
) -> AppResult<ApiResponse<OtpSentResponse>> {
    let masked_phone = state
        .auth_service
        .resend_otp(&req.user_id, req.purpose)
        .await?;

    Ok(ApiResponse::ok(OtpSentResponse {
        user_id: req.user_id,
        masked_phone,
    }))
}

/// Set the first password and log in.
async fn set_password(
    State(state): State<AppState>,
    Json(input): Json<SetPasswordInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.auth_service.set_password(input).await?;
    Ok(ApiResponse::ok(session.into()))
}

/// Log in.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.auth_service.login(input).await?;
    Ok(ApiResponse::ok(session.into()))
}

/// Send a password reset OTP.
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<ApiResponse<OtpSentResponse>> {
    let masked_phone = state.auth_service.forgot_password(&req.user_id).await?;

    Ok(ApiResponse::ok(OtpSentResponse {
        user_id: req.user_id,
        masked_phone,
    }))
}

/// Set a new password with the reset OTP.
async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<ApiResponse<Ack>> {
    state.auth_service.reset_password(input).await?;
    Ok(ack("Password reset successfully, please log in"))
}

/// End the current session.
async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<ApiResponse<Ack>> {
    state.auth_service.logout(&token).await?;
    Ok(ack("Logged out"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-registration", post(verify_registration))
        .route("/resend-otp", post(resend_otp))
        .route("/set-password", post(set_password))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/logout", post(logout))
}
