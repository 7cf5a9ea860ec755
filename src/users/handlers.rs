use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::state::AppState;
use crate::users::dto::{LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest};
use crate::users::error::UserError;
use crate::users::repo_types::{AuthOutcome, UpdateUser};

pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
}

pub fn crud_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", put(update_user).get(get_user).delete(remove_user))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Transport-level failure. Every core `UserError` variant maps onto exactly
/// one of these; the body shape is always `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Unauthorized,
    NotFound,
    Conflict,
    Internal(anyhow::Error),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateEmail => ApiError::Conflict,
            UserError::NotFound => ApiError::NotFound,
            UserError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "User not found"),
            ApiError::Conflict => (StatusCode::CONFLICT, "Email already registered"),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let user = state
        .users
        .register(&payload.email, &payload.password, payload.username.as_deref())
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    validate_email(&payload.email)?;

    match state.users.authenticate(&payload.email, &payload.password).await? {
        AuthOutcome::Authenticated(user) => {
            info!(user_id = user.id, "user logged in");
            Ok(Json(PublicUser::from(user)))
        }
        AuthOutcome::Unauthenticated => {
            warn!(email = %payload.email, "login rejected");
            Err(ApiError::Unauthorized)
        }
    }
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.users.get(id).await?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }

    let patch = UpdateUser {
        email: payload.email,
        password: payload.password,
        // an empty string in a patch counts as an explicit clear
        username: payload
            .username
            .map(|u| u.filter(|name| !name.is_empty())),
    };

    let user = state.users.update(id, patch).await?;
    info!(user_id = user.id, "user updated");
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state))]
pub async fn remove_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.users.remove(id).await?;
    info!(user_id = id, "user removed");
    Ok(Json(json!({ "message": "User removed successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::User;
    use time::OffsetDateTime;

    #[test]
    fn email_validation_accepts_plain_addresses_only() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a @x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a@@x.com"));
    }

    #[test]
    fn api_error_status_mapping_is_stable() {
        assert_eq!(
            ApiError::from(UserError::DuplicateEmail).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(UserError::NotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(UserError::Internal(anyhow::anyhow!("boom")))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::BadRequest("Invalid email").into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn public_user_never_carries_the_hash() {
        let user = User {
            id: 7,
            email: "test@example.com".to_string(),
            username: Some("tester".to_string()),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("tester"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
