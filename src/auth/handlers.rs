use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, instrument, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest};
use crate::auth::extractors::CurrentUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{Role, User};
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let username = payload.username.unwrap_or_default().trim().to_string();
    let password = payload.password.unwrap_or_default();

    if username.chars().count() < 3 {
        warn!("register rejected: username too short");
        return Err(ApiError::Validation(
            "Username must be at least 3 characters".into(),
        ));
    }
    if password.chars().count() < 6 {
        warn!("register rejected: password too short");
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    if User::find_by_username(&state.db, &username)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        warn!(%username, "register rejected: username taken");
        return Err(ApiError::Conflict("Username is already taken".into()));
    }

    let hash = hash_password(&password)?;

    // Role is always forced to `user`; the unique constraint backstops the
    // availability check above under concurrent registration.
    let user = User::create(&state.db, &username, &hash, Role::User).await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, %username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    // Unknown username and bad password produce the same response.
    let invalid = || ApiError::Unauthorized("Invalid username or password".into());

    let user = User::find_by_username(&state.db, &username)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            warn!(%username, "login unknown username");
            invalid()
        })?;

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, %username, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        user: user.into(),
        token,
    }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile(user: CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        user: crate::auth::dto::PublicUser {
            id: user.id,
            username: user.username,
            role: user.role,
        },
    })
}
