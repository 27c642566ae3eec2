// Router configuration

use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        activity_handlers::*, auth_handlers::*, board_handlers::*, card_handlers::*,
        comment_handlers::*, health_handlers::*, list_handlers::*, workspace_handlers::*,
    },
    live::board_ws_handler,
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        // Health & Info
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        // Authentication
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(current_user_handler))
        // Workspaces
        .route(
            "/api/workspaces",
            post(create_workspace_handler).get(list_workspaces_handler),
        )
        // Boards
        .route(
            "/api/boards",
            post(create_board_handler).get(list_boards_handler),
        )
        .route("/api/boards/{board_id}", get(get_board_handler))
        .route(
            "/api/boards/{board_id}/lists",
            post(create_list_handler).get(list_lists_handler),
        )
        .route("/api/boards/{board_id}/cards", get(list_board_cards_handler))
        .route(
            "/api/boards/{board_id}/activities",
            get(list_activities_handler),
        )
        .route("/api/boards/{board_id}/search", get(search_cards_handler))
        // Cards & Comments
        .route("/api/lists/{list_id}/cards", post(create_card_handler))
        .route("/api/cards/{card_id}", put(update_card_handler))
        .route(
            "/api/cards/{card_id}/comments",
            post(create_comment_handler).get(list_comments_handler),
        )
        // Live updates
        .route("/api/ws/{board_id}", get(board_ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
