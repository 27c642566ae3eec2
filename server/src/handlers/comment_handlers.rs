// Comment handlers. The owning board is resolved through the card → list →
// board chain before anything else happens.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use corkboard_core::{activity::ActivityType, boards::Board, comments::Comment};
use serde_json::json;

use crate::{
    auth::{authenticate_request, resolve_board_access},
    error::AppError,
    state::AppState,
    types::CreateCommentRequest,
};

/// Comment text is truncated in activity details past this many characters.
const COMMENT_DETAIL_LIMIT: usize = 100;

pub(crate) async fn create_comment_handler(
    Path(card_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Response, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    let board = resolve_comment_board(&state, &user.id, &card_id).await?;

    if payload.text.trim().is_empty() {
        return Err(AppError::bad_request("comment text must not be empty"));
    }

    let comment = state
        .comment_store
        .create(&card_id, &user.id, &payload.text)
        .await
        .map_err(AppError::from_anyhow)?;

    state
        .activity_pipeline
        .record(
            &board.id,
            &user.id,
            ActivityType::CommentAdded,
            json!({
                "card_id": card_id,
                "comment_id": comment.id,
                "comment_text": truncate_comment(&comment.text),
            }),
        )
        .await
        .map_err(AppError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

pub(crate) async fn list_comments_handler(
    Path(card_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Comment>>, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    resolve_comment_board(&state, &user.id, &card_id).await?;

    let comments = state
        .comment_store
        .list_for_card(&card_id)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(comments))
}

async fn resolve_comment_board(
    state: &AppState,
    user_id: &str,
    card_id: &str,
) -> Result<Board, AppError> {
    let Some(card) = state
        .card_store
        .find_by_id(card_id)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Err(AppError::card_not_found(card_id));
    };

    let list = state
        .list_store
        .find_by_id(&card.list_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| {
            AppError::internal(anyhow!("card {card_id} references missing list {}", card.list_id))
        })?;

    resolve_board_access(state, user_id, &list.board_id).await
}

fn truncate_comment(text: &str) -> String {
    if text.chars().count() > COMMENT_DETAIL_LIMIT {
        let head: String = text.chars().take(COMMENT_DETAIL_LIMIT).collect();
        format!("{head}...")
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corkboard_core::cards::CardDraft;

    use crate::test_support::{seed_board, seed_user, setup_state};

    async fn seed_card(state: &AppState, owner_id: &str) -> (String, String) {
        let board = seed_board(state, owner_id).await;
        let list = state
            .list_store
            .create(&board.id, "Todo", None)
            .await
            .expect("create list");
        let card = state
            .card_store
            .create(
                &list.id,
                CardDraft {
                    title: "Discuss".to_owned(),
                    ..CardDraft::default()
                },
            )
            .await
            .expect("create card");
        (board.id, card.id)
    }

    #[test]
    fn truncation_applies_past_one_hundred_characters() {
        let exactly = "a".repeat(100);
        assert_eq!(truncate_comment(&exactly), exactly);

        let longer = "b".repeat(101);
        let truncated = truncate_comment(&longer);
        assert_eq!(truncated.chars().count(), 103);
        assert!(truncated.ends_with("..."));
        assert!(truncated.starts_with(&"b".repeat(100)));
    }

    #[tokio::test]
    async fn comment_activity_carries_truncated_text() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (user, headers) = seed_user(&state, "owner@example.com").await;
        let (board_id, card_id) = seed_card(&state, &user.id).await;

        let long_text = "x".repeat(150);
        let response = create_comment_handler(
            Path(card_id.clone()),
            State(state.clone()),
            headers,
            Json(CreateCommentRequest {
                text: long_text.clone(),
            }),
        )
        .await
        .expect("create comment");
        assert_eq!(response.status(), StatusCode::CREATED);

        // The comment itself is stored unmodified.
        let comments = state
            .comment_store
            .list_for_card(&card_id)
            .await
            .expect("list comments");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, long_text);
        assert_eq!(comments[0].author_id, user.id);

        let activities = state
            .activity_store
            .list_for_board(&board_id, 10)
            .await
            .expect("activities");
        assert_eq!(activities[0].activity_type, ActivityType::CommentAdded);
        let detail_text = activities[0].details["comment_text"]
            .as_str()
            .expect("detail text");
        assert_eq!(detail_text.chars().count(), 103);
        assert!(detail_text.ends_with("..."));
    }

    #[tokio::test]
    async fn short_comment_text_is_logged_unmodified() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (user, headers) = seed_user(&state, "owner@example.com").await;
        let (board_id, card_id) = seed_card(&state, &user.id).await;

        create_comment_handler(
            Path(card_id.clone()),
            State(state.clone()),
            headers,
            Json(CreateCommentRequest {
                text: "Looks good".into(),
            }),
        )
        .await
        .expect("create comment");

        let activities = state
            .activity_store
            .list_for_board(&board_id, 10)
            .await
            .expect("activities");
        assert_eq!(activities[0].details["comment_text"], "Looks good");
    }

    #[tokio::test]
    async fn comments_are_listed_oldest_first_and_guarded() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (user, headers) = seed_user(&state, "owner@example.com").await;
        let (_stranger, stranger_headers) = seed_user(&state, "stranger@example.com").await;
        let (_board_id, card_id) = seed_card(&state, &user.id).await;

        for text in ["first", "second"] {
            create_comment_handler(
                Path(card_id.clone()),
                State(state.clone()),
                headers.clone(),
                Json(CreateCommentRequest { text: text.into() }),
            )
            .await
            .expect("create comment");
        }

        let Json(thread) = list_comments_handler(
            Path(card_id.clone()),
            State(state.clone()),
            headers,
        )
        .await
        .expect("list comments");
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].text, "first");
        assert_eq!(thread[1].text, "second");

        let err = list_comments_handler(
            Path(card_id.clone()),
            State(state.clone()),
            stranger_headers,
        )
        .await
        .expect_err("stranger denied");
        assert_eq!(err.into_payload().0, StatusCode::NOT_FOUND);
    }
}
