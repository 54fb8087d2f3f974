mod dto;
pub mod gateway;
pub mod handlers;
mod signature;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::payment_routes()
}
