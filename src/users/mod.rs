use crate::{config::UsersConfig, state::AppState};
use axum::Router;

mod dto;
pub mod handlers;
pub mod model;
pub mod password;
pub mod repo;
pub mod repo_types;
#[cfg(test)]
pub(crate) mod testing;

pub fn router(cfg: UsersConfig) -> Router<AppState> {
    handlers::user_routes(cfg)
}
