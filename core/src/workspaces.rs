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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub user_id: String,
    pub role: WorkspaceRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: String,
    pub members: Vec<WorkspaceMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct WorkspaceStore {
    collection: Collection,
}

impl WorkspaceStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: Collection::new(database, "workspaces"),
        }
    }

    /// The owner starts as the sole member, with the admin role.
    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Workspace> {
        let now = timestamps::utc_now();
        let workspace = Workspace {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            description: description.map(ToOwned::to_owned),
            owner_id: owner_id.to_owned(),
            members: vec![WorkspaceMember {
                user_id: owner_id.to_owned(),
                role: WorkspaceRole::Admin,
            }],
            created_at: now,
            updated_at: now,
        };

        self.collection.insert(&workspace).await?;
        Ok(workspace)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Workspace>> {
        self.collection.find_by_id(id).await
    }

    pub async fn list_for_member(&self, user_id: &str) -> Result<Vec<Workspace>> {
        self.collection
            .find(&Query::new().filter(Filter::Eq(
                "members.user_id",
                JsonValue::String(user_id.to_owned()),
            )))
            .await
    }
}
