use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    db::Database,
    documents::{Collection, Filter, Query},
    timestamps,
};

/// Bearer sessions are valid for 24 hours.
pub const SESSION_TTL_SECONDS: i64 = 60 * 60 * 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone)]
pub struct UserStore {
    users: Collection,
    sessions: Collection,
}

impl UserStore {
    pub fn new(database: &Database) -> Self {
        Self {
            users: Collection::new(database, "users"),
            sessions: Collection::new(database, "sessions"),
        }
    }

    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        avatar_url: Option<&str>,
    ) -> Result<User> {
        let now = timestamps::utc_now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_owned(),
            name: name.to_owned(),
            avatar_url: avatar_url.map(ToOwned::to_owned),
            password_hash: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
        };

        self.users.insert(&user).await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.users.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut matches: Vec<User> = self
            .users
            .find(&Query::new().filter(Filter::Eq("email", JsonValue::String(email.to_owned()))))
            .await?;
        Ok(matches.pop())
    }

    pub async fn create_session(&self, user_id: &str) -> Result<Session> {
        let created_at = timestamps::utc_now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            created_at,
            expires_at: created_at + Duration::seconds(SESSION_TTL_SECONDS),
        };

        self.sessions.insert(&session).await?;
        Ok(session)
    }

    /// Expired sessions are deleted on lookup and reported as absent.
    pub async fn find_session(&self, session_id: &str) -> Result<Option<Session>> {
        let Some(session) = self.sessions.find_by_id::<Session>(session_id).await? else {
            return Ok(None);
        };

        if session.is_expired(timestamps::utc_now()) {
            self.delete_session(&session.id).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.sessions.delete(session_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db::Database};
    use tempfile::TempDir;

    async fn setup_store() -> (TempDir, UserStore) {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut config = AppConfig::default();
        config.database_path = temp_dir
            .path()
            .join("users.db")
            .to_string_lossy()
            .into_owned();

        let database = Database::connect(&config).await.expect("connect database");
        sqlx::migrate!("../server/migrations")
            .run(database.pool())
            .await
            .expect("apply migrations");

        (temp_dir, UserStore::new(&database))
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let (_temp_dir, store) = setup_store().await;
        let created = store
            .create("alice@example.com", "Alice", "hash", None)
            .await
            .expect("create user");

        let found = store
            .find_by_email("alice@example.com")
            .await
            .expect("find user")
            .expect("user present");
        assert_eq!(found, created);

        let missing = store
            .find_by_email("nobody@example.com")
            .await
            .expect("find missing");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn sessions_expire_after_their_window() {
        let (_temp_dir, store) = setup_store().await;
        let user = store
            .create("bob@example.com", "Bob", "hash", None)
            .await
            .expect("create user");

        let session = store
            .create_session(&user.id)
            .await
            .expect("create session");
        assert_eq!(
            session.expires_at - session.created_at,
            Duration::seconds(SESSION_TTL_SECONDS)
        );

        let live = store
            .find_session(&session.id)
            .await
            .expect("find session");
        assert!(live.is_some());

        // Backdate a second session past its expiry and watch it get reaped.
        let created_at = timestamps::utc_now() - Duration::seconds(2 * SESSION_TTL_SECONDS);
        let stale = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            created_at,
            expires_at: created_at + Duration::seconds(SESSION_TTL_SECONDS),
        };
        store.sessions.insert(&stale).await.expect("insert stale");

        let reaped = store
            .find_session(&stale.id)
            .await
            .expect("find stale session");
        assert!(reaped.is_none());

        let gone: Option<Session> = store
            .sessions
            .find_by_id(&stale.id)
            .await
            .expect("lookup stale session");
        assert!(gone.is_none(), "expired session should be deleted");
    }
}
