use std::cmp::Ordering;

use anyhow::{Context, Result, bail};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map as JsonMap, Value as JsonValue};
use sqlx::{Pool, Row, Sqlite};
use tracing::warn;

use crate::{db::Database, timestamps};

/// One document collection: rows of `(id, doc)` where `doc` holds the JSON
/// serialization of a single entity. All entities are keyed by their own
/// `id` field; secondary filtering, sorting and limits are applied here
/// rather than in SQL.
#[derive(Clone)]
pub struct Collection {
    pool: Pool<Sqlite>,
    name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub enum Filter {
    /// Exact match on a dotted path. A segment that lands on an array matches
    /// when any element matches, so `members.user_id` finds documents whose
    /// member set contains the user.
    Eq(&'static str, JsonValue),
    /// Scalar field contained in the set, or array field intersecting it.
    In(&'static str, Vec<String>),
    /// Case-insensitive substring match against any of the named fields.
    MatchesAny(&'static [&'static str], String),
}

impl Filter {
    fn matches(&self, doc: &JsonValue) -> bool {
        match self {
            Filter::Eq(path, expected) => path_matches(doc, path, expected),
            Filter::In(field, values) => doc.get(field).is_some_and(|entry| match entry {
                JsonValue::Array(items) => items
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .any(|item| values.iter().any(|value| value == item)),
                JsonValue::String(item) => values.iter().any(|value| value == item),
                _ => false,
            }),
            Filter::MatchesAny(fields, needle) => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    doc.get(*field)
                        .and_then(JsonValue::as_str)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

fn path_matches(value: &JsonValue, path: &str, expected: &JsonValue) -> bool {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    match value {
        JsonValue::Array(items) => items.iter().any(|item| path_matches(item, path, expected)),
        JsonValue::Object(map) => match (map.get(head), rest) {
            (Some(child), Some(rest)) => path_matches(child, rest, expected),
            (Some(child), None) => value_matches(child, expected),
            (None, _) => false,
        },
        _ => false,
    }
}

fn value_matches(value: &JsonValue, expected: &JsonValue) -> bool {
    match value {
        JsonValue::Array(items) => items.iter().any(|item| item == expected),
        other => other == expected,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<Filter>,
    sort: Option<(&'static str, SortOrder)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, field: &'static str, order: SortOrder) -> Self {
        self.sort = Some((field, order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Collection {
    pub fn new(database: &Database, name: &'static str) -> Self {
        Self {
            pool: database.pool().clone(),
            name,
        }
    }

    pub async fn insert<T: Serialize>(&self, entity: &T) -> Result<()> {
        let mut doc = serde_json::to_value(entity)
            .with_context(|| format!("failed to serialize {} document", self.name))?;
        timestamps::transcode_timestamps(&mut doc);

        let id = doc
            .get("id")
            .and_then(JsonValue::as_str)
            .with_context(|| format!("{} document is missing an id", self.name))?
            .to_owned();

        sqlx::query(&format!("INSERT INTO {} (id, doc) VALUES (?, ?)", self.name))
            .bind(&id)
            .bind(doc.to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to insert into {}", self.name))?;

        Ok(())
    }

    pub async fn find_by_id<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = ?", self.name))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut doc: JsonValue = serde_json::from_str(&row.get::<String, _>("doc"))
            .with_context(|| format!("corrupt {} document {id}", self.name))?;
        timestamps::transcode_timestamps(&mut doc);

        let entity = serde_json::from_value(doc)
            .with_context(|| format!("failed to decode {} document {id}", self.name))?;
        Ok(Some(entity))
    }

    pub async fn find<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let rows = sqlx::query(&format!("SELECT id, doc FROM {}", self.name))
            .fetch_all(&self.pool)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get("doc");
            match serde_json::from_str::<JsonValue>(&raw) {
                Ok(mut doc) => {
                    timestamps::transcode_timestamps(&mut doc);
                    docs.push(doc);
                }
                Err(error) => {
                    let id: String = row.get("id");
                    warn!(collection = self.name, %id, %error, "skipping undecodable document");
                }
            }
        }

        docs.retain(|doc| query.filters.iter().all(|filter| filter.matches(doc)));

        if let Some((field, order)) = query.sort {
            docs.sort_by(|a, b| {
                let ordering = compare_fields(a.get(field), b.get(field));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }

        docs.into_iter()
            .map(|doc| {
                serde_json::from_value(doc)
                    .with_context(|| format!("failed to decode {} document", self.name))
            })
            .collect()
    }

    /// Merge only the supplied top-level fields into the stored document.
    /// Absent fields are left untouched. The read-modify-write is not atomic,
    /// matching the rest of the mutation path.
    pub async fn update_fields(&self, id: &str, fields: JsonMap<String, JsonValue>) -> Result<bool> {
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = ?", self.name))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(false);
        };

        let mut doc: JsonValue = serde_json::from_str(&row.get::<String, _>("doc"))
            .with_context(|| format!("corrupt {} document {id}", self.name))?;
        let Some(map) = doc.as_object_mut() else {
            bail!("{} document {id} is not an object", self.name);
        };

        for (key, value) in fields {
            map.insert(key, value);
        }
        timestamps::transcode_timestamps(&mut doc);

        sqlx::query(&format!("UPDATE {} SET doc = ? WHERE id = ?", self.name))
            .bind(doc.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update {} document {id}", self.name))?;

        Ok(true)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", self.name))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn compare_fields(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => compare_values(left, right),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(left: &JsonValue, right: &JsonValue) -> Ordering {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => l
            .as_f64()
            .unwrap_or(f64::NAN)
            .partial_cmp(&r.as_f64().unwrap_or(f64::NAN))
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(l), JsonValue::String(r)) => l.cmp(r),
        _ => Ordering::Equal,
    }
}
