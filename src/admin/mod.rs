mod dto;
mod form;
pub mod handlers;

use axum::{extract::DefaultBodyLimit, middleware, Router};

use crate::auth::extractors::require_admin;
use crate::state::AppState;

/// Every route here sits behind the admin gate.
pub fn router(state: AppState) -> Router<AppState> {
    // room for the text fields next to the image
    let body_limit = state.config.uploads.max_bytes + 64 * 1024;
    handlers::user_routes()
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .layer(DefaultBodyLimit::max(body_limit))
}
