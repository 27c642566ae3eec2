use anyhow::Result;
use corkboard_core::activity::{ActivityLog, ActivityStore, ActivityType};
use serde_json::{Value as JsonValue, json};
use tracing::warn;

use crate::live::BoardChannels;

/// Records an activity entry and fans it out to live viewers of the board.
/// The entry is durably persisted before any broadcast is attempted, and
/// delivery failures never reach the caller: a mutation succeeds even when
/// zero subscribers are connected or every send fails.
#[derive(Clone)]
pub struct ActivityPipeline {
    activity_store: ActivityStore,
    board_channels: BoardChannels,
}

impl ActivityPipeline {
    pub fn new(activity_store: ActivityStore, board_channels: BoardChannels) -> Self {
        Self {
            activity_store,
            board_channels,
        }
    }

    pub async fn record(
        &self,
        board_id: &str,
        actor_id: &str,
        activity_type: ActivityType,
        details: JsonValue,
    ) -> Result<ActivityLog> {
        let entry = self
            .activity_store
            .append(board_id, actor_id, activity_type, details)
            .await?;

        let envelope = json!({ "type": "activity", "activity": entry });
        match serde_json::to_string(&envelope) {
            Ok(frame) => self.board_channels.broadcast(board_id, &frame),
            Err(error) => warn!(%board_id, %error, "failed to encode activity envelope"),
        }

        Ok(entry)
    }
}
