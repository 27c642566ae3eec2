// Request and response types for the REST API handlers.

use chrono::{DateTime, Utc};
use corkboard_core::{boards::BoardVisibility, cards::CardDraft, users::User};
use serde::{Deserialize, Serialize};

// ========== Request Types ==========

#[derive(Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Deserialize)]
pub(crate) struct CreateWorkspaceRequest {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct CreateBoardRequest {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) workspace_id: Option<String>,
    #[serde(default)]
    pub(crate) visibility: BoardVisibility,
}

#[derive(Deserialize)]
pub(crate) struct CreateListRequest {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) position: Option<f64>,
}

#[derive(Deserialize)]
pub(crate) struct CreateCardRequest {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) position: Option<f64>,
    #[serde(default)]
    pub(crate) labels: Vec<String>,
    #[serde(default)]
    pub(crate) assignees: Vec<String>,
    #[serde(default)]
    pub(crate) due_date: Option<DateTime<Utc>>,
}

impl From<CreateCardRequest> for CardDraft {
    fn from(request: CreateCardRequest) -> Self {
        CardDraft {
            title: request.title,
            description: request.description,
            position: request.position,
            labels: request.labels,
            assignees: request.assignees,
            due_date: request.due_date,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct CreateCommentRequest {
    pub(crate) text: String,
}

#[derive(Deserialize, Default)]
pub(crate) struct ActivitiesQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Deserialize, Default)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(default)]
    pub(crate) labels: Option<String>,
    #[serde(default)]
    pub(crate) assignees: Option<String>,
}

// ========== Response Types ==========

/// Public view of a user: everything except the password hash.
#[derive(Clone, Serialize)]
pub(crate) struct UserPayload {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) avatar_url: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<&User> for UserPayload {
    fn from(record: &User) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            name: record.name.clone(),
            avatar_url: record.avatar_url.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct TokenPayload {
    pub(crate) access_token: String,
    pub(crate) token_type: &'static str,
    pub(crate) user: UserPayload,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
}

#[derive(Serialize)]
pub(crate) struct ServerInfoResponse {
    pub(crate) name: &'static str,
    pub(crate) version: &'static str,
}
