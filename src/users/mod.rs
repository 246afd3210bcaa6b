use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod error;
pub mod handlers;
mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::UserStore;
pub use repo_types::User;
pub use services::UserService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
