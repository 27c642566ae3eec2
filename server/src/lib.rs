pub mod auth;
pub mod error;
pub mod events;
pub mod handlers;
pub mod live;
pub mod router;
pub mod state;
pub mod types;

pub use error::AppError;
pub use state::{AppState, build_state};

pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

#[cfg(test)]
pub mod test_support;
