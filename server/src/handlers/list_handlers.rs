// List (board column) handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use corkboard_core::{activity::ActivityType, lists::BoardList};
use serde_json::json;

use crate::{
    auth::{authenticate_request, resolve_board_access},
    error::AppError,
    state::AppState,
    types::CreateListRequest,
};

pub(crate) async fn create_list_handler(
    Path(board_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateListRequest>,
) -> Result<Response, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    let board = resolve_board_access(&state, &user.id, &board_id).await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("list title must not be empty"));
    }

    let list = state
        .list_store
        .create(&board.id, title, payload.position)
        .await
        .map_err(AppError::from_anyhow)?;

    state
        .activity_pipeline
        .record(
            &board.id,
            &user.id,
            ActivityType::ListCreated,
            json!({ "list_id": list.id, "list_title": list.title }),
        )
        .await
        .map_err(AppError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(list)).into_response())
}

pub(crate) async fn list_lists_handler(
    Path(board_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<BoardList>>, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    let board = resolve_board_access(&state, &user.id, &board_id).await?;

    let lists = state
        .list_store
        .list_for_board(&board.id)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(lists))
}
