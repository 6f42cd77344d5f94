use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use parley::providers::base::ProviderListing;

// The listing is computed at start and never changes
async fn list_providers(State(state): State<AppState>) -> Json<ProviderListing> {
    Json(state.orchestrator.listing().clone())
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat/providers", get(list_providers))
        .with_state(state)
}
