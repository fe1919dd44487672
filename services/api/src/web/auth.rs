//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and the caller's profile.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;
use duotrack_core::domain::{Identity, NewUser};
use duotrack_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::dto::UserDto;
use crate::web::middleware::session_token;
use crate::web::response::{respond, ApiResponse, HttpError, HttpResult};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserDto,
    /// The same opaque id as the `session` cookie, for clients that send a bearer token.
    pub token: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, HttpError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            HttpError::internal()
        })
}

/// Opens an auth session for `user_id` and returns its id with the cookie to set.
async fn open_session(state: &AppState, user_id: Uuid) -> Result<(String, HeaderValue), HttpError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);

    state
        .db
        .create_auth_session(&auth_session_id, user_id, state.now() + ttl)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            HttpError::internal()
        })?;

    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    );
    let cookie = HeaderValue::from_str(&cookie).map_err(|_| HttpError::internal())?;
    Ok((auth_session_id, cookie))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Missing name, email or password"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> HttpResult {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(HttpError::bad_request("All fields are required"));
    }

    // 1. Hash the password
    let hashed_password = hash_password(&req.password)?;

    // 2. Create user in database
    let user = state
        .db
        .create_user(NewUser {
            name: name.to_string(),
            email,
            hashed_password,
        })
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => HttpError::new(StatusCode::CONFLICT, "User already exists"),
            other => other.into(),
        })?;
    info!("New user {} signed up", user.id);

    // 3. Open the auth session
    let (token, cookie) = open_session(&state, user.id).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok(
            "User registered successfully",
            AuthResponse {
                user: user.into(),
                token,
            },
        )),
    )
        .into_response())
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HttpResult {
    let invalid = || HttpError::unauthorized("Invalid email or password");

    // 1. Get user by email
    let email = req.email.trim().to_lowercase();
    let user_creds = state.db.get_user_by_email(&email).await.map_err(|e| match e {
        PortError::NotFound(_) => invalid(),
        other => other.into(),
    })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal()
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    // 3. Open the auth session
    let user = state.db.get_user(user_creds.user_id).await?;
    let (token, cookie) = open_session(&state, user.id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok(
            "Login successful",
            AuthResponse {
                user: user.into(),
                token,
            },
        )),
    )
        .into_response())
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> HttpResult {
    // 1. Find the session id
    let auth_session_id =
        session_token(&headers).ok_or_else(|| HttpError::unauthorized("No session found"))?;

    // 2. Delete auth session from database
    state
        .db
        .delete_auth_session(&auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            HttpError::internal()
        })?;

    // 3. Clear cookie
    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(ApiResponse::message(true, "Logged out")),
    )
        .into_response())
}

/// GET /users/me - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Profile of the caller", body = UserDto),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let user = state.db.get_user(identity.user_id).await?;
    Ok(respond(StatusCode::OK, "User fetched", UserDto::from(user)))
}
