// Authentication and the board access guard.

use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use axum::http::{HeaderMap, header::AUTHORIZATION};
use corkboard_core::{boards::Board, users::User};

use crate::{error::AppError, state::AppState};

pub fn generate_password_hash(password: &str) -> Result<String, PasswordHashError> {
    let mut rng = OsRng;
    let salt = SaltString::generate(&mut rng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|err| AppError::internal(err.into()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::unauthorized("incorrect email or password"))
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}

/// Resolve the bearer credential to its user. Missing, unknown and expired
/// tokens are indistinguishable to the caller.
pub(crate) async fn authenticate_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<User, AppError> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;

    let Some(session) = state
        .user_store
        .find_session(&token)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Err(AppError::unauthorized("invalid or expired session"));
    };

    state
        .user_store
        .find_by_id(&session.user_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::unauthorized("invalid or expired session"))
}

/// Access guard for board-scoped operations: membership implies full access,
/// and a board that does not exist yields the same outcome as one the user
/// is not a member of.
pub(crate) async fn resolve_board_access(
    state: &AppState,
    user_id: &str,
    board_id: &str,
) -> Result<Board, AppError> {
    let board = state
        .board_store
        .find_by_id(board_id)
        .await
        .map_err(AppError::from_anyhow)?;

    match board {
        Some(board) if board.is_member(user_id) => Ok(board),
        _ => Err(AppError::board_not_found(board_id)),
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}
