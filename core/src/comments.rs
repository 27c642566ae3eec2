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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub card_id: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CommentStore {
    collection: Collection,
}

impl CommentStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: Collection::new(database, "comments"),
        }
    }

    pub async fn create(&self, card_id: &str, author_id: &str, text: &str) -> Result<Comment> {
        let now = timestamps::utc_now();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            text: text.to_owned(),
            card_id: card_id.to_owned(),
            author_id: author_id.to_owned(),
            created_at: now,
            updated_at: now,
        };

        self.collection.insert(&comment).await?;
        Ok(comment)
    }

    /// Comments display oldest-first.
    pub async fn list_for_card(&self, card_id: &str) -> Result<Vec<Comment>> {
        self.collection
            .find(
                &Query::new()
                    .filter(Filter::Eq("card_id", JsonValue::String(card_id.to_owned())))
                    .sort("created_at", SortOrder::Ascending),
            )
            .await
    }
}
