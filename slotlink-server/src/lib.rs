//! HTTP booking service for slotlink.

pub mod routes;
pub mod state;

use axum::Router;
use slotlink_core::mail::Mailer;
use tower_http::cors::{Any, CorsLayer};

pub use state::AppState;

/// All routes, with permissive CORS so a static page on another origin can
/// call the service.
pub fn app<M: Mailer + 'static>(state: AppState<M>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::booking::router::<M>())
        .merge(routes::schedules::router::<M>())
        .merge(routes::view::router::<M>())
        .with_state(state)
        .layer(cors)
}
