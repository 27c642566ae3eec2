// Workspace handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use corkboard_core::workspaces::Workspace;

use crate::{
    auth::authenticate_request, error::AppError, state::AppState, types::CreateWorkspaceRequest,
};

pub(crate) async fn create_workspace_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> Result<Response, AppError> {
    let user = authenticate_request(&state, &headers).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("workspace name must not be empty"));
    }

    let workspace = state
        .workspace_store
        .create(&user.id, name, payload.description.as_deref())
        .await
        .map_err(AppError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(workspace)).into_response())
}

pub(crate) async fn list_workspaces_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Workspace>>, AppError> {
    let user = authenticate_request(&state, &headers).await?;

    let workspaces = state
        .workspace_store
        .list_for_member(&user.id)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Json(workspaces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value as JsonValue;

    use crate::test_support::{seed_user, setup_state};

    #[tokio::test]
    async fn create_workspace_makes_the_owner_sole_admin() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (user, headers) = seed_user(&state, "owner@example.com").await;

        let response = create_workspace_handler(
            State(state.clone()),
            headers,
            Json(CreateWorkspaceRequest {
                name: "Product".into(),
                description: Some("Everything product".into()),
            }),
        )
        .await
        .expect("create workspace");

        assert_eq!(response.status(), StatusCode::CREATED);
        let (_parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["owner_id"], user.id);
        assert_eq!(json["members"].as_array().unwrap().len(), 1);
        assert_eq!(json["members"][0]["user_id"], user.id);
        assert_eq!(json["members"][0]["role"], "admin");
    }

    #[tokio::test]
    async fn create_workspace_rejects_blank_names() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (_user, headers) = seed_user(&state, "owner@example.com").await;

        let err = create_workspace_handler(
            State(state.clone()),
            headers,
            Json(CreateWorkspaceRequest {
                name: "   ".into(),
                description: None,
            }),
        )
        .await
        .expect_err("blank name rejected");
        assert_eq!(err.into_payload().0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_only_returns_memberships() {
        let (_temp_dir, _database, state) = setup_state().await;
        let (owner, owner_headers) = seed_user(&state, "owner@example.com").await;
        let (_other, other_headers) = seed_user(&state, "other@example.com").await;

        state
            .workspace_store
            .create(&owner.id, "Mine", None)
            .await
            .expect("create workspace");

        let Json(mine) = list_workspaces_handler(State(state.clone()), owner_headers)
            .await
            .expect("list workspaces");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Mine");

        let Json(none) = list_workspaces_handler(State(state.clone()), other_headers)
            .await
            .expect("list workspaces");
        assert!(none.is_empty());
    }
}
