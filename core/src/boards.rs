use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    db::Database,
    documents::{Collection, Filter, Query},
    timestamps,
};

/// Board roles are carried in the member set for forward compatibility, but
/// access checks only test membership: every member may perform every
/// board-scoped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardRole {
    Owner,
    Admin,
    Editor,
    Commenter,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardVisibility {
    #[default]
    Private,
    Workspace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardMember {
    pub user_id: String,
    pub role: BoardRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub visibility: BoardVisibility,
    pub owner_id: String,
    pub members: Vec<BoardMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|member| member.user_id == user_id)
    }
}

#[derive(Clone)]
pub struct BoardStore {
    collection: Collection,
}

impl BoardStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: Collection::new(database, "boards"),
        }
    }

    /// The owner starts as the sole member, with the owner role.
    pub async fn create(
        &self,
        owner_id: &str,
        title: &str,
        workspace_id: Option<&str>,
        visibility: BoardVisibility,
    ) -> Result<Board> {
        let now = timestamps::utc_now();
        let board = Board {
            id: Uuid::new_v4().to_string(),
            title: title.to_owned(),
            workspace_id: workspace_id.map(ToOwned::to_owned),
            visibility,
            owner_id: owner_id.to_owned(),
            members: vec![BoardMember {
                user_id: owner_id.to_owned(),
                role: BoardRole::Owner,
            }],
            created_at: now,
            updated_at: now,
        };

        self.collection.insert(&board).await?;
        Ok(board)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Board>> {
        self.collection.find_by_id(id).await
    }

    pub async fn list_for_member(&self, user_id: &str) -> Result<Vec<Board>> {
        self.collection
            .find(&Query::new().filter(Filter::Eq(
                "members.user_id",
                JsonValue::String(user_id.to_owned()),
            )))
            .await
    }
}
