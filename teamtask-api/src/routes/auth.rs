/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an account and its personal organization
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new access token
/// - `GET /v1/auth/me` - The current user and their organizations

use crate::{app::AppState, error::ApiResult, middleware::auth::CurrentUser};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    auth::jwt::{self, TokenPair, TokenType},
    models::{Organization, OrganizationMembership, User},
};
use validator::Validate;

/// Signup request
///
/// Blank usernames and short passwords are rejected by the auth service.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(max = 50, message = "Username must be at most 50 characters"))]
    pub username: String,

    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: String,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: User,

    /// The personal organization created with the account
    pub organization: Organization,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub organizations: Vec<OrganizationMembership>,
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// { "username": "alice", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Blank username or short password
/// - `409 Conflict`: Username already taken
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    req.validate()?;

    let signup = state.auth.signup(&req.username, &req.password).await?;
    let tokens = jwt::issue_token_pair(signup.user.id, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: signup.user,
            organization: signup.organization,
            tokens,
        }),
    ))
}

/// Login with username and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password (indistinguishable)
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = state.auth.login(&req.username, &req.password).await?;
    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse { user, tokens }))
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired or access token presented
pub async fn refresh(State(state): State<AppState>, Json(req): Json<RefreshRequest>) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    }))
}

pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<Json<MeResponse>> {
    let user = state.auth.get_user(current.id).await?;
    let organizations = state.organizations.list_organizations_for_user(current.id).await?;

    Ok(Json(MeResponse { user, organizations }))
}
