use corkboard_core::{
    activity::ActivityStore, boards::BoardStore, cards::CardStore, comments::CommentStore,
    db::Database, lists::ListStore, users::UserStore, workspaces::WorkspaceStore,
};

use crate::{events::ActivityPipeline, live::BoardChannels};

#[derive(Clone)]
pub struct AppState {
    pub user_store: UserStore,
    pub workspace_store: WorkspaceStore,
    pub board_store: BoardStore,
    pub list_store: ListStore,
    pub card_store: CardStore,
    pub comment_store: CommentStore,
    pub activity_store: ActivityStore,
    pub board_channels: BoardChannels,
    pub activity_pipeline: ActivityPipeline,
}

pub fn build_state(database: &Database) -> AppState {
    let board_channels = BoardChannels::new();
    let activity_store = ActivityStore::new(database);
    let activity_pipeline = ActivityPipeline::new(activity_store.clone(), board_channels.clone());

    AppState {
        user_store: UserStore::new(database),
        workspace_store: WorkspaceStore::new(database),
        board_store: BoardStore::new(database),
        list_store: ListStore::new(database),
        card_store: CardStore::new(database),
        comment_store: CommentStore::new(database),
        activity_store,
        board_channels,
        activity_pipeline,
    }
}
