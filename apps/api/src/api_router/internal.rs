use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::post;

use crate::state::AppState;
use crate::{handlers, middleware};

pub(super) fn build_internal_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/internal/triggers/post-confirmation",
            post(handlers::triggers::post_confirmation_handler),
        )
        .route_layer(from_fn_with_state(
            app_state,
            middleware::require_gateway_secret,
        ))
}
