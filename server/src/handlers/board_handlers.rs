// Board handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use corkboard_core::boards::Board;

use crate::{
    auth::{authenticate_request, resolve_board_access},
    error::AppError,
    state::AppState,
    types::CreateBoardRequest,
};

pub(crate) async fn create_board_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateBoardRequest>,
) -> Result<Response, AppError> {
    let user = authenticate_request(&state, &headers).await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("board title must not be empty"));
    }

    let board = state
        .board_store
        .create(
            &user.id,
            title,
            payload.workspace_id.as_deref(),
            payload.visibility,
        )
        .await
        .map_err(AppError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(board)).into_response())
}

pub(crate) async fn list_boards_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Board>>, AppError> {
    let user = authenticate_request(&state, &headers).await?;

    let boards = state
        .board_store
        .list_for_member(&user.id)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(boards))
}

pub(crate) async fn get_board_handler(
    Path(board_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Board>, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    let board = resolve_board_access(&state, &user.id, &board_id).await?;
    Ok(Json(board))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use corkboard_core::boards::BoardVisibility;
    use serde_json::Value as JsonValue;

    use crate::test_support::{seed_user, setup_state};

    #[tokio::test]
    async fn create_board_makes_the_owner_sole_member() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (user, headers) = seed_user(&state, "owner@example.com").await;

        let response = create_board_handler(
            State(state.clone()),
            headers,
            Json(CreateBoardRequest {
                title: "Roadmap".into(),
                workspace_id: None,
                visibility: BoardVisibility::default(),
            }),
        )
        .await
        .expect("create board");

        assert_eq!(response.status(), StatusCode::CREATED);
        let (_parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["owner_id"], user.id);
        assert_eq!(json["visibility"], "private");
        assert_eq!(json["members"].as_array().unwrap().len(), 1);
        assert_eq!(json["members"][0]["role"], "owner");
    }

    #[tokio::test]
    async fn read_and_missing_board_outcomes_are_identical_for_non_members() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (owner, _owner_headers) = seed_user(&state, "owner@example.com").await;
        let (_stranger, stranger_headers) = seed_user(&state, "stranger@example.com").await;

        let board = state
            .board_store
            .create(&owner.id, "Secret", None, BoardVisibility::default())
            .await
            .expect("create board");

        let denied = get_board_handler(
            Path(board.id.clone()),
            State(state.clone()),
            stranger_headers.clone(),
        )
        .await
        .expect_err("non-member denied");
        let (denied_status, denied_payload) = denied.into_payload();

        let missing = get_board_handler(
            Path("missing-board".into()),
            State(state.clone()),
            stranger_headers,
        )
        .await
        .expect_err("missing board");
        let (missing_status, missing_payload) = missing.into_payload();

        assert_eq!(denied_status, StatusCode::NOT_FOUND);
        assert_eq!(missing_status, StatusCode::NOT_FOUND);
        assert_eq!(denied_payload.name, missing_payload.name);
    }

    #[tokio::test]
    async fn listing_only_returns_member_boards() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (owner, headers) = seed_user(&state, "owner@example.com").await;
        let (other, _other_headers) = seed_user(&state, "other@example.com").await;

        state
            .board_store
            .create(&owner.id, "Mine", None, BoardVisibility::default())
            .await
            .expect("create board");
        state
            .board_store
            .create(&other.id, "Theirs", None, BoardVisibility::default())
            .await
            .expect("create board");

        let Json(boards) = list_boards_handler(State(state.clone()), headers)
            .await
            .expect("list boards");
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].title, "Mine");
    }
}
