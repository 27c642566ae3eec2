#![allow(dead_code)]

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
use corkboard_core::{
    boards::{Board, BoardVisibility},
    config::AppConfig,
    db::Database,
    users::User,
};
use tempfile::TempDir;

use crate::{
    auth::generate_password_hash,
    state::{AppState, build_state},
};

pub(crate) async fn setup_state() -> (TempDir, Database, AppState) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let mut config = AppConfig::default();
    let db_path = temp_dir.path().join("test.db");
    config.database_path = db_path.to_string_lossy().into_owned();

    let database = Database::connect(&config).await.expect("connect database");
    sqlx::migrate!("./migrations")
        .run(database.pool())
        .await
        .expect("apply migrations");

    let state = build_state(&database);
    (temp_dir, database, state)
}

/// Create a user with password "password" and return it with ready-to-use
/// bearer headers.
pub(crate) async fn seed_user(state: &AppState, email: &str) -> (User, HeaderMap) {
    let password_hash = generate_password_hash("password").expect("hash password");
    let user = state
        .user_store
        .create(email, "Tester", &password_hash, None)
        .await
        .expect("create user");
    let session = state
        .user_store
        .create_session(&user.id)
        .await
        .expect("create session");

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", session.id)).expect("authorization header"),
    );

    (user, headers)
}

pub(crate) async fn seed_board(state: &AppState, owner_id: &str) -> Board {
    state
        .board_store
        .create(owner_id, "Roadmap", None, BoardVisibility::default())
        .await
        .expect("create board")
}
