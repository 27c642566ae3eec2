use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

use crate::{
    db::Database,
    documents::{Collection, Filter, Query, SortOrder},
    positions, timestamps,
};

/// A card belongs to exactly one list at a time; moving it between lists
/// reassigns `list_id`. Ascending `position` is the canonical render order
/// within a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub list_id: String,
    pub position: f64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default, with = "timestamps::lenient_instant")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub title: String,
    pub description: Option<String>,
    pub position: Option<f64>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update: each field is present-or-absent, and only present fields
/// reach the stored document. An absent field is a no-op, never a clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl CardPatch {
    /// A patch that reassigns `list_id` is a move, whatever else it changes.
    pub fn moves_list(&self) -> bool {
        self.list_id.is_some()
    }

    /// The fields this patch will write: only the present ones, plus a fresh
    /// `updated_at`.
    pub fn changed_fields(&self) -> Result<JsonMap<String, JsonValue>> {
        let mut fields = match serde_json::to_value(self)? {
            JsonValue::Object(map) => map,
            other => bail!("card patch serialized to a non-object value: {other}"),
        };

        fields.insert(
            "updated_at".to_owned(),
            JsonValue::String(timestamps::to_canonical(&timestamps::utc_now())),
        );

        Ok(fields)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardSearch {
    pub text: Option<String>,
    pub labels: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct CardStore {
    collection: Collection,
}

impl CardStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: Collection::new(database, "cards"),
        }
    }

    /// An explicit position wins; otherwise the card is appended after the
    /// list's current maximum. As with lists, concurrent appends to the same
    /// list are not serialized.
    pub async fn create(&self, list_id: &str, draft: CardDraft) -> Result<Card> {
        let position = match draft.position {
            Some(value) => value,
            None => positions::next_position(self.max_position(list_id).await?),
        };

        let now = timestamps::utc_now();
        let card = Card {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            list_id: list_id.to_owned(),
            position,
            labels: draft.labels,
            assignees: draft.assignees,
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
        };

        self.collection.insert(&card).await?;
        Ok(card)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Card>> {
        self.collection.find_by_id(id).await
    }

    pub async fn max_position(&self, list_id: &str) -> Result<Option<f64>> {
        let top: Vec<Card> = self
            .collection
            .find(
                &Query::new()
                    .filter(Filter::Eq("list_id", JsonValue::String(list_id.to_owned())))
                    .sort("position", SortOrder::Descending)
                    .limit(1),
            )
            .await?;

        Ok(top.first().map(|card| card.position))
    }

    /// All cards across the given lists, ascending by position.
    pub async fn list_for_lists(&self, list_ids: &[String]) -> Result<Vec<Card>> {
        if list_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.collection
            .find(
                &Query::new()
                    .filter(Filter::In("list_id", list_ids.to_vec()))
                    .sort("position", SortOrder::Ascending),
            )
            .await
    }

    /// Write the supplied fields into the card document and return the
    /// updated card, or `None` if the card vanished underneath us.
    pub async fn apply_fields(
        &self,
        id: &str,
        fields: JsonMap<String, JsonValue>,
    ) -> Result<Option<Card>> {
        if !self.collection.update_fields(id, fields).await? {
            return Ok(None);
        }

        self.collection.find_by_id(id).await
    }

    /// Search within a board's lists: optional case-insensitive text match on
    /// title or description, optional label-set intersection, optional
    /// assignee-set intersection. Results ascend by position.
    pub async fn search(&self, list_ids: &[String], search: &CardSearch) -> Result<Vec<Card>> {
        if list_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = Query::new()
            .filter(Filter::In("list_id", list_ids.to_vec()))
            .sort("position", SortOrder::Ascending);

        if let Some(text) = search.text.as_deref() {
            if !text.is_empty() {
                query = query.filter(Filter::MatchesAny(
                    &["title", "description"],
                    text.to_owned(),
                ));
            }
        }

        if let Some(labels) = &search.labels {
            query = query.filter(Filter::In("labels", labels.clone()));
        }

        if let Some(assignees) = &search.assignees {
            query = query.filter(Filter::In("assignees", assignees.clone()));
        }

        self.collection.find(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db::Database};
    use serde_json::json;
    use tempfile::TempDir;

    async fn setup_store() -> (TempDir, CardStore) {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut config = AppConfig::default();
        config.database_path = temp_dir
            .path()
            .join("cards.db")
            .to_string_lossy()
            .into_owned();

        let database = Database::connect(&config).await.expect("connect database");
        sqlx::migrate!("../server/migrations")
            .run(database.pool())
            .await
            .expect("apply migrations");

        (temp_dir, CardStore::new(&database))
    }

    fn draft(title: &str) -> CardDraft {
        CardDraft {
            title: title.to_owned(),
            ..CardDraft::default()
        }
    }

    #[tokio::test]
    async fn appended_cards_step_by_one_thousand_per_list() {
        let (_temp_dir, store) = setup_store().await;

        let first = store.create("l1", draft("One")).await.expect("create card");
        let second = store.create("l1", draft("Two")).await.expect("create card");
        let other = store.create("l2", draft("Elsewhere")).await.expect("create card");

        assert_eq!(first.position, 1000.0);
        assert_eq!(second.position, 2000.0);
        assert_eq!(other.position, 1000.0);
    }

    #[tokio::test]
    async fn changed_fields_carries_only_present_fields() {
        let patch = CardPatch {
            title: Some("Renamed".to_owned()),
            ..CardPatch::default()
        };

        let fields = patch.changed_fields().expect("changed fields");
        assert_eq!(fields.get("title"), Some(&json!("Renamed")));
        assert!(fields.contains_key("updated_at"));
        assert!(!fields.contains_key("description"));
        assert!(!fields.contains_key("list_id"));
        assert_eq!(fields.len(), 2);
    }

    #[tokio::test]
    async fn apply_fields_patches_without_clearing_others() {
        let (_temp_dir, store) = setup_store().await;
        let card = store
            .create(
                "l1",
                CardDraft {
                    title: "Write docs".to_owned(),
                    description: Some("for the release".to_owned()),
                    labels: vec!["docs".to_owned()],
                    ..CardDraft::default()
                },
            )
            .await
            .expect("create card");

        let patch = CardPatch {
            list_id: Some("l2".to_owned()),
            position: Some(1500.0),
            ..CardPatch::default()
        };
        let updated = store
            .apply_fields(&card.id, patch.changed_fields().expect("changed fields"))
            .await
            .expect("apply patch")
            .expect("card present");

        assert_eq!(updated.list_id, "l2");
        assert_eq!(updated.position, 1500.0);
        assert_eq!(updated.title, "Write docs");
        assert_eq!(updated.description.as_deref(), Some("for the release"));
        assert_eq!(updated.labels, vec!["docs".to_owned()]);
        assert_eq!(updated.created_at, card.created_at);
        assert!(updated.updated_at >= card.updated_at);
    }

    #[tokio::test]
    async fn search_matches_text_labels_and_assignees() {
        let (_temp_dir, store) = setup_store().await;
        store
            .create(
                "l1",
                CardDraft {
                    title: "Fix login".to_owned(),
                    labels: vec!["urgent".to_owned(), "bug".to_owned()],
                    assignees: vec!["u1".to_owned()],
                    position: Some(2000.0),
                    ..CardDraft::default()
                },
            )
            .await
            .expect("create card");
        store
            .create(
                "l2",
                CardDraft {
                    title: "Polish UI".to_owned(),
                    description: Some("login screen styling".to_owned()),
                    labels: vec!["design".to_owned()],
                    assignees: vec!["u2".to_owned()],
                    position: Some(1000.0),
                    ..CardDraft::default()
                },
            )
            .await
            .expect("create card");
        store
            .create("l3", draft("Out of scope"))
            .await
            .expect("create card");

        let scope = vec!["l1".to_owned(), "l2".to_owned()];

        let by_text = store
            .search(
                &scope,
                &CardSearch {
                    text: Some("LOGIN".to_owned()),
                    ..CardSearch::default()
                },
            )
            .await
            .expect("search by text");
        assert_eq!(by_text.len(), 2);
        assert_eq!(by_text[0].title, "Polish UI");
        assert_eq!(by_text[1].title, "Fix login");

        let by_label = store
            .search(
                &scope,
                &CardSearch {
                    labels: Some(vec!["urgent".to_owned()]),
                    ..CardSearch::default()
                },
            )
            .await
            .expect("search by label");
        assert_eq!(by_label.len(), 1);
        assert_eq!(by_label[0].title, "Fix login");

        let by_assignee = store
            .search(
                &scope,
                &CardSearch {
                    assignees: Some(vec!["u2".to_owned()]),
                    ..CardSearch::default()
                },
            )
            .await
            .expect("search by assignee");
        assert_eq!(by_assignee.len(), 1);
        assert_eq!(by_assignee[0].title, "Polish UI");

        let empty_scope = store
            .search(&[], &CardSearch::default())
            .await
            .expect("search empty scope");
        assert!(empty_scope.is_empty());
    }
}
