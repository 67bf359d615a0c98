use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use enermina_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;
mod internal;

#[cfg(test)]
mod tests;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let api_routes = Router::new()
        .route(
            "/api/records/{entity}",
            get(handlers::records::list_records_handler)
                .post(handlers::records::create_record_handler),
        )
        .route(
            "/api/records/{entity}/{key}",
            get(handlers::records::get_record_handler)
                .put(handlers::records::update_record_handler)
                .delete(handlers::records::delete_record_handler),
        )
        .route(
            "/api/records/{entity}/{key}/relationships/{relationship}",
            get(handlers::records::related_records_handler),
        )
        .route(
            "/api/records/{entity}/{key}/transitions",
            post(handlers::lifecycle::transition_record_handler),
        )
        .route(
            "/api/subscriptions/{entity}",
            get(handlers::records::subscription_scope_handler),
        )
        .route(
            "/api/resources/{key}/download",
            post(handlers::records::resource_download_handler),
        )
        .route(
            "/api/mutations/add-user-to-group",
            post(handlers::mutations::add_user_to_group_handler),
        )
        .route(
            "/api/mutations/admin-create-user",
            post(handlers::mutations::admin_create_user_handler),
        )
        .route(
            "/api/mutations/add-or-update-searchable-record",
            post(handlers::mutations::add_or_update_searchable_record_handler),
        )
        .route(
            "/api/mutations/delete-searchable-record",
            post(handlers::mutations::delete_searchable_record_handler),
        )
        .route(
            "/api/mutations/create-stream-token",
            post(handlers::mutations::create_stream_token_handler),
        )
        .route(
            "/api/mutations/support-contact-email",
            post(handlers::mutations::support_contact_email_handler),
        )
        .route(
            "/api/storage/access",
            post(handlers::storage::storage_access_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::resolve_subject,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(api_routes)
        .merge(internal::build_internal_routes(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
