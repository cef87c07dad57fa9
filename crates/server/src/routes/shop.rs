//! Shop account route handlers.
//!
//! Registration, OTP verification, login, profile and password reset.
//! Only the profile route requires a bearer token.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use super::MessageResponse;
use crate::error::Result;
use crate::middleware::RequireShop;
use crate::models::ShopAccount;
use crate::services::auth::{LoginOutcome, Registration};
use crate::state::AppState;

/// Request body for OTP verification.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Request body naming only an email address.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Request body for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for completing a password reset.
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
}

/// Register a new shop.
///
/// POST /api/shop/register
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<ShopAccount>)> {
    let Json(registration) = payload?;
    let shop = state.accounts().register(registration).await?;
    Ok((StatusCode::CREATED, Json(shop)))
}

/// Confirm the emailed OTP.
///
/// POST /api/shop/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = payload?;
    state.accounts().verify_otp(&req.email, &req.otp).await?;
    Ok(Json(MessageResponse::new("Account verified")))
}

/// Send a fresh OTP.
///
/// POST /api/shop/resend-otp
pub async fn resend_otp(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = payload?;
    state.accounts().resend_otp(&req.email).await?;
    Ok(Json(MessageResponse::new(
        "If the account is awaiting verification, a new code has been sent",
    )))
}

/// Exchange credentials for a session token.
///
/// POST /api/shop/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginOutcome>> {
    let Json(req) = payload?;
    let outcome = state.accounts().login(&req.email, &req.password).await?;
    Ok(Json(outcome))
}

/// The authenticated shop.
///
/// GET /api/shop/profile
pub async fn profile(RequireShop(shop): RequireShop) -> Json<ShopAccount> {
    Json(shop)
}

/// Start a password reset.
///
/// POST /api/shop/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = payload?;
    state.accounts().forgot_password(&req.email).await?;
    Ok(Json(MessageResponse::new(
        "If an account exists for that email, a reset link has been sent",
    )))
}

/// Complete a password reset with the emailed token.
///
/// POST /api/shop/reset-password/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: std::result::Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = payload?;
    state
        .accounts()
        .reset_password(&token, &req.email, &req.password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated")))
}
