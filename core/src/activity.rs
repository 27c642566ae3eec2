use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    db::Database,
    documents::{Collection, Filter, Query, SortOrder},
    timestamps,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    CardCreated,
    CardMoved,
    CardUpdated,
    CardDeleted,
    CommentAdded,
    ListCreated,
    ListUpdated,
    ListDeleted,
    MemberAdded,
    MemberRemoved,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::CardCreated => "card_created",
            ActivityType::CardMoved => "card_moved",
            ActivityType::CardUpdated => "card_updated",
            ActivityType::CardDeleted => "card_deleted",
            ActivityType::CommentAdded => "comment_added",
            ActivityType::ListCreated => "list_created",
            ActivityType::ListUpdated => "list_updated",
            ActivityType::ListDeleted => "list_deleted",
            ActivityType::MemberAdded => "member_added",
            ActivityType::MemberRemoved => "member_removed",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record of one mutation. Not authoritative state; used
/// for history display and as the live-notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub board_id: String,
    pub user_id: String,
    pub activity_type: ActivityType,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ActivityStore {
    collection: Collection,
}

impl ActivityStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: Collection::new(database, "activity_logs"),
        }
    }

    /// Entries are inserted once and never updated or deleted.
    pub async fn append(
        &self,
        board_id: &str,
        user_id: &str,
        activity_type: ActivityType,
        details: JsonValue,
    ) -> Result<ActivityLog> {
        let entry = ActivityLog {
            id: Uuid::new_v4().to_string(),
            board_id: board_id.to_owned(),
            user_id: user_id.to_owned(),
            activity_type,
            details,
            created_at: timestamps::utc_now(),
        };

        self.collection.insert(&entry).await?;
        Ok(entry)
    }

    /// Most recent first, capped at `limit`.
    pub async fn list_for_board(&self, board_id: &str, limit: usize) -> Result<Vec<ActivityLog>> {
        self.collection
            .find(
                &Query::new()
                    .filter(Filter::Eq(
                        "board_id",
                        JsonValue::String(board_id.to_owned()),
                    ))
                    .sort("created_at", SortOrder::Descending)
                    .limit(limit),
            )
            .await
    }
}
