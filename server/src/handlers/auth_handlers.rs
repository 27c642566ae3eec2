// Registration, login and current-user handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    auth::{authenticate_request, generate_password_hash, is_valid_email, verify_password},
    error::AppError,
    state::AppState,
    types::{LoginRequest, RegisterRequest, TokenPayload, UserPayload},
};

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let email = payload.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::bad_request("invalid email address"));
    }

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }

    if payload.password.is_empty() {
        return Err(AppError::bad_request("password is required"));
    }

    // Duplicate registration is rejected before any write.
    let existing = state
        .user_store
        .find_by_email(email)
        .await
        .map_err(AppError::from_anyhow)?;
    if existing.is_some() {
        return Err(AppError::conflict("email already registered"));
    }

    let password_hash =
        generate_password_hash(&payload.password).map_err(|err| AppError::internal(err.into()))?;

    let user = state
        .user_store
        .create(email, name, &password_hash, payload.avatar_url.as_deref())
        .await
        .map_err(AppError::from_anyhow)?;

    let session = state
        .user_store
        .create_session(&user.id)
        .await
        .map_err(AppError::from_anyhow)?;

    let response = TokenPayload {
        access_token: session.id,
        token_type: "bearer",
        user: UserPayload::from(&user),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = payload.email.trim();

    let Some(user) = state
        .user_store
        .find_by_email(email)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Err(AppError::unauthorized("incorrect email or password"));
    };

    verify_password(&payload.password, &user.password_hash)?;

    let session = state
        .user_store
        .create_session(&user.id)
        .await
        .map_err(AppError::from_anyhow)?;

    let response = TokenPayload {
        access_token: session.id,
        token_type: "bearer",
        user: UserPayload::from(&user),
    };

    Ok(Json(response).into_response())
}

pub(crate) async fn current_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    Ok(Json(UserPayload::from(&user)).into_response())
}
