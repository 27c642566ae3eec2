// Activity feed handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use corkboard_core::activity::ActivityLog;

use crate::{
    DEFAULT_ACTIVITY_LIMIT,
    auth::{authenticate_request, resolve_board_access},
    error::AppError,
    state::AppState,
    types::ActivitiesQuery,
};

pub(crate) async fn list_activities_handler(
    Path(board_id): Path<String>,
    Query(params): Query<ActivitiesQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ActivityLog>>, AppError> {
    let user = authenticate_request(&state, &headers).await?;
    let board = resolve_board_access(&state, &user.id, &board_id).await?;

    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    let activities = state
        .activity_store
        .list_for_board(&board.id, limit)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(activities))
}
