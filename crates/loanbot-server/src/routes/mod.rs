// Export route modules
pub mod index;
pub mod sessions;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(index::routes())
        .merge(sessions::routes(state))
}
