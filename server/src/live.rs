// Live-update channel: per-board subscriber registry and the WebSocket
// endpoint feeding it.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::state::AppState;

/// Registry of live subscribers, grouped strictly by board id. A connection
/// only ever receives events for the board it subscribed to. The registry is
/// owned by `AppState` and injected wherever broadcasting happens; nothing
/// reaches it through process-global state.
#[derive(Clone, Default)]
pub struct BoardChannels {
    subscribers: Arc<DashMap<String, Vec<BoardSubscriber>>>,
    next_id: Arc<AtomicU64>,
}

struct BoardSubscriber {
    id: u64,
    sender: UnboundedSender<Message>,
}

impl BoardChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, board_id: &str) -> (u64, UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .entry(board_id.to_owned())
            .or_default()
            .push(BoardSubscriber { id, sender });
        (id, receiver)
    }

    pub fn unsubscribe(&self, board_id: &str, subscriber_id: u64) {
        if let Some(mut entry) = self.subscribers.get_mut(board_id) {
            entry.retain(|subscriber| subscriber.id != subscriber_id);
        }
        self.subscribers
            .remove_if(board_id, |_, subscribers| subscribers.is_empty());
    }

    /// Best-effort fan-out. Sends go to a snapshot of the current subscriber
    /// set; handles whose channel is gone are pruned after the iteration
    /// completes, never while iterating.
    pub fn broadcast(&self, board_id: &str, text: &str) {
        let snapshot: Vec<(u64, UnboundedSender<Message>)> = match self.subscribers.get(board_id) {
            Some(entry) => entry
                .iter()
                .map(|subscriber| (subscriber.id, subscriber.sender.clone()))
                .collect(),
            None => return,
        };

        let mut failed = Vec::new();
        for (id, sender) in snapshot {
            if sender.send(Message::Text(text.to_owned().into())).is_err() {
                failed.push(id);
            }
        }

        if failed.is_empty() {
            return;
        }

        debug!(board_id, pruned = failed.len(), "pruning dead board subscribers");
        if let Some(mut entry) = self.subscribers.get_mut(board_id) {
            entry.retain(|subscriber| !failed.contains(&subscriber.id));
        }
        self.subscribers
            .remove_if(board_id, |_, subscribers| subscribers.is_empty());
    }

    pub fn subscriber_count(&self, board_id: &str) -> usize {
        self.subscribers
            .get(board_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}

pub(crate) async fn board_ws_handler(
    Path(board_id): Path<String>,
    State(state): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> Response {
    let channels = state.board_channels.clone();
    upgrade.on_upgrade(move |socket| run_board_socket(socket, channels, board_id))
}

async fn run_board_socket(socket: WebSocket, channels: BoardChannels, board_id: String) {
    let (subscriber_id, mut receiver) = channels.subscribe(&board_id);
    debug!(%board_id, subscriber_id, "board subscriber connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = receiver.recv() => {
                let Some(message) = outbound else { break };
                if sink.send(message).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // The channel is broadcast-only; inbound frames are ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    channels.unsubscribe(&board_id, subscriber_id);
    debug!(%board_id, subscriber_id, "board subscriber disconnected");
}
