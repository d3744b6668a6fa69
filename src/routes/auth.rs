//! Account endpoints: register, login, logout, session check

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

use super::{error_message, internal_error, store_error, ApiError};
use crate::config::Config;
use crate::error::StoreError;
use crate::middleware::auth::token_from_headers;
use crate::models::{NewUser, User};
use crate::services::auth::TOKEN_COOKIE;
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Request to register
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_verify: String,
}

/// Request to log in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Check registration fields; returns the message to show on failure
fn validate_registration(req: &RegisterRequest) -> Result<(), &'static str> {
    if req.first_name.trim().is_empty()
        || req.last_name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.password.is_empty()
        || req.password_verify.is_empty()
    {
        return Err("Please enter all required fields.");
    }
    if !EMAIL_RE.is_match(req.email.trim()) {
        return Err("Please enter a valid email address.");
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err("Please enter a password of at least 8 characters.");
    }
    if req.password != req.password_verify {
        return Err("Please enter the same password twice.");
    }
    Ok(())
}

/// `Set-Cookie` value carrying a session token (empty token clears it)
fn session_cookie(config: &Config, token: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}",
        TOKEN_COOKIE, token, max_age_secs
    );
    if config.is_production() {
        cookie.push_str("; SameSite=None; Secure");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    cookie
}

/// Build the success response for a freshly authenticated user
fn signed_in(state: &AppState, user: &User) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .auth
        .create_token(&user.id)
        .map_err(|e| internal_error("Failed to issue token", e))?;
    let cookie = session_cookie(&state.config, &token, state.auth.token_ttl_secs());

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({
            "success": true,
            "user": user.to_public(),
        })),
    ))
}

/// GET /auth/loggedIn - Report whether the request carries a valid session
pub async fn get_logged_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let not_logged_in = |message: &str| {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "loggedIn": false,
                "user": null,
                "errorMessage": message,
            })),
        )
    };

    let user_id = match token_from_headers(&headers).map(|t| state.auth.verify_token(&t)) {
        Some(Ok(user_id)) => user_id,
        _ => return not_logged_in("?"),
    };

    match state.db.get_user_by_id(&user_id).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "loggedIn": true,
                "user": user.to_public(),
            })),
        ),
        Ok(None) => not_logged_in("?"),
        Err(e) => {
            tracing::error!("Failed to load user {}: {}", user_id, e);
            not_logged_in("?")
        }
    }
}

/// POST /auth/login - Check credentials and start a session
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|_| {
        error_message(StatusCode::BAD_REQUEST, "Please enter all required fields.")
    })?;

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(error_message(
            StatusCode::BAD_REQUEST,
            "Please enter all required fields.",
        ));
    }

    let wrong_credentials =
        || error_message(StatusCode::UNAUTHORIZED, "Wrong email or password provided.");

    let user = state
        .db
        .get_user_by_email(req.email.trim())
        .await
        .map_err(|e| internal_error("Failed to look up user", e))?
        .ok_or_else(wrong_credentials)?;

    let auth = state.auth.clone();
    let hash = user.password_hash.clone();
    let password = req.password;
    let matches = tokio::task::spawn_blocking(move || auth.verify_password(&password, &hash))
        .await
        .map_err(|e| internal_error("Password check panicked", e))?
        .map_err(|e| internal_error("Password check failed", e))?;

    if !matches {
        return Err(wrong_credentials());
    }

    tracing::info!("User {} logged in", user.id);
    signed_in(&state, &user)
}

/// GET /auth/logout - Clear the session cookie
pub async fn logout_user(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&state.config, "", 0))],
        Json(serde_json::json!({})),
    )
}

/// POST /auth/register - Create an account and start a session
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|_| {
        error_message(StatusCode::BAD_REQUEST, "Please enter all required fields.")
    })?;

    validate_registration(&req).map_err(|msg| error_message(StatusCode::BAD_REQUEST, msg))?;

    let email = req.email.trim().to_string();
    let already_exists = || {
        error_message(
            StatusCode::BAD_REQUEST,
            "An account with this email address already exists.",
        )
    };

    let existing = state
        .db
        .get_user_by_email(&email)
        .await
        .map_err(|e| internal_error("Failed to look up user", e))?;
    if existing.is_some() {
        return Err(already_exists());
    }

    let auth = state.auth.clone();
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || auth.hash_password(&password))
        .await
        .map_err(|e| internal_error("Password hashing panicked", e))?
        .map_err(|e| internal_error("Password hashing failed", e))?;

    let user = match state
        .db
        .create_user(NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email,
            password_hash,
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::EmailTaken(_)) => return Err(already_exists()),
        Err(e) => return Err(store_error("Failed to create user", e)),
    };

    tracing::info!("Registered user {} ({})", user.id, user.email);
    signed_in(&state, &user)
}
