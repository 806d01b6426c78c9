pub mod handlers;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api", api_routes())
        // Admin routes
        .nest("/admin", admin_routes())
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/payments", payment_routes())
        .nest("/quota", quota_routes())
        .route("/methods", get(handlers::methods::list_enabled))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::users::create))
        .route("/:id", get(handlers::users::get))
        .route("/:id/balance", get(handlers::users::balance))
        .route("/:id/ledger", get(handlers::users::ledger))
        .route("/:id/credits", get(handlers::users::credits))
        .route("/:id/payments", get(handlers::users::payments))
        .route("/:id/referrals", get(handlers::users::referrals))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/card", post(handlers::payments::submit_card))
        .route("/crypto", post(handlers::payments::submit_crypto))
        .route("/bank", post(handlers::payments::submit_bank))
}

fn quota_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id/can-generate", get(handlers::quota::can_generate))
        .route("/:user_id/consume", post(handlers::quota::consume))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route("/users/:id/grant", post(handlers::admin::grant_tokens))
        .route("/payments", get(handlers::admin::list_payments))
        .route("/payments/:id/approve", post(handlers::admin::approve_payment))
        .route("/payments/:id/reject", post(handlers::admin::reject_payment))
        .route("/payments/:id/requeue", post(handlers::admin::requeue_payment))
        .route("/payments/:id/revalidate", post(handlers::admin::revalidate_payment))
        .route("/payments/:id", delete(handlers::admin::delete_payment))
        .route("/methods", get(handlers::methods::list_all))
        .route("/methods/:id", put(handlers::methods::update))
        .route("/plan-price", get(handlers::admin::get_plan_price))
        .route("/plan-price", put(handlers::admin::set_plan_price))
}
