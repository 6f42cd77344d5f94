// Export route modules
pub mod chat;
pub mod health;
pub mod providers;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(chat::routes(state.clone()))
        .merge(providers::routes(state))
        .merge(health::routes())
}
