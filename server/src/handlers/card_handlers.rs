// Card handlers: create, board-wide listing, partial update and search.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use corkboard_core::{
    activity::ActivityType,
    cards::{Card, CardPatch, CardSearch},
};
use serde_json::{Value as JsonValue, json};

use crate::{
    auth::{authenticate_request, resolve_board_access},
    error::AppError,
    state::AppState,
    types::{CreateCardRequest, SearchQuery},
};

pub(crate) async fn create_card_handler(
    Path(list_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCardRequest>,
) -> Result<Response, AppError> {
    let user = authenticate_request(&state, &headers).await?;

    let Some(list) = state
        .list_store
        .find_by_id(&list_id)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Err(AppError::list_not_found(&list_id));
    };

    let board = resolve_board_access(&state, &user.id, &list.board_id).await?;

    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("card title must not be empty"));
    }

    let card = state
        .card_store
        .create(&list.id, payload.into())
        .await
        .map_err(AppError::from_anyhow)?;

    state
        .activity_pipeline
        .record(
            &board.id,
            &user.id,
            ActivityType::CardCreated,
            json!({ "card_id": card.id, "card_title": card.title, "list_id": list.id }),
        )
        .await
        .map_err(AppError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(card)).into_response())
}

pub(crate) async fn list_board_cards_handler(
    Path(board_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Card>>, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    let board = resolve_board_access(&state, &user.id, &board_id).await?;

    let list_ids = board_list_ids(&state, &board.id).await?;
    let cards = state
        .card_store
        .list_for_lists(&list_ids)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(cards))
}

pub(crate) async fn update_card_handler(
    Path(card_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(patch): Json<CardPatch>,
) -> Result<Json<Card>, AppError> {
    let user = authenticate_request(&state, &headers).await?;

    let Some(card) = state
        .card_store
        .find_by_id(&card_id)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Err(AppError::card_not_found(&card_id));
    };

    // Access is checked against the card's current list's board, before the
    // patch moves anything.
    let list = state
        .list_store
        .find_by_id(&card.list_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| {
            AppError::internal(anyhow!("card {card_id} references missing list {}", card.list_id))
        })?;
    let board = resolve_board_access(&state, &user.id, &list.board_id).await?;

    let changes = patch.changed_fields().map_err(AppError::from_anyhow)?;
    let updated = state
        .card_store
        .apply_fields(&card.id, changes.clone())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::card_not_found(&card_id))?;

    let activity_type = if patch.moves_list() {
        ActivityType::CardMoved
    } else {
        ActivityType::CardUpdated
    };

    state
        .activity_pipeline
        .record(
            &board.id,
            &user.id,
            activity_type,
            json!({
                "card_id": updated.id,
                "card_title": updated.title,
                "changes": JsonValue::Object(changes),
            }),
        )
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(updated))
}

pub(crate) async fn search_cards_handler(
    Path(board_id): Path<String>,
    Query(params): Query<SearchQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Card>>, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    let board = resolve_board_access(&state, &user.id, &board_id).await?;

    let list_ids = board_list_ids(&state, &board.id).await?;
    let search = CardSearch {
        text: params.q,
        labels: params.labels.as_deref().map(split_csv),
        assignees: params.assignees.as_deref().map(split_csv),
    };

    let cards = state
        .card_store
        .search(&list_ids, &search)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(cards))
}

async fn board_list_ids(state: &AppState, board_id: &str) -> Result<Vec<String>, AppError> {
    let lists = state
        .list_store
        .list_for_board(board_id)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(lists.into_iter().map(|list| list.id).collect())
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
