use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    db::Database,
    documents::{Collection, Filter, Query, SortOrder},
    positions, timestamps,
};

/// A board column. `board_id` is immutable after creation; ascending
/// `position` is the canonical render order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub title: String,
    pub board_id: String,
    pub position: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ListStore {
    collection: Collection,
}

impl ListStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: Collection::new(database, "lists"),
        }
    }

    /// An explicit position wins; otherwise the list is appended after the
    /// board's current maximum. The read-max-then-insert sequence is not
    /// serialized against concurrent appends to the same board.
    pub async fn create(
        &self,
        board_id: &str,
        title: &str,
        position: Option<f64>,
    ) -> Result<BoardList> {
        let position = match position {
            Some(value) => value,
            None => positions::next_position(self.max_position(board_id).await?),
        };

        let now = timestamps::utc_now();
        let list = BoardList {
            id: Uuid::new_v4().to_string(),
            title: title.to_owned(),
            board_id: board_id.to_owned(),
            position,
            created_at: now,
            updated_at: now,
        };

        self.collection.insert(&list).await?;
        Ok(list)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<BoardList>> {
        self.collection.find_by_id(id).await
    }

    pub async fn list_for_board(&self, board_id: &str) -> Result<Vec<BoardList>> {
        self.collection
            .find(
                &Query::new()
                    .filter(Filter::Eq(
                        "board_id",
                        JsonValue::String(board_id.to_owned()),
                    ))
                    .sort("position", SortOrder::Ascending),
            )
            .await
    }

    pub async fn max_position(&self, board_id: &str) -> Result<Option<f64>> {
        let top: Vec<BoardList> = self
            .collection
            .find(
                &Query::new()
                    .filter(Filter::Eq(
                        "board_id",
                        JsonValue::String(board_id.to_owned()),
                    ))
                    .sort("position", SortOrder::Descending)
                    .limit(1),
            )
            .await?;

        Ok(top.first().map(|list| list.position))
    }
}
