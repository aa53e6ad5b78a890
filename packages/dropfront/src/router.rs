//! HTTP router setup.

use crate::handlers;
use crate::middleware;
use crate::mint::MintSubmitter;
use crate::queries::DropQueries;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Mint bodies are a wallet and a quantity.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create the application router.
pub fn create<Q: DropQueries, S: MintSubmitter>(state: Arc<AppState<Q, S>>) -> Router {
    Router::new()
        .route("/", get(handlers::page::<Q, S>))
        .route(
            "/mint",
            post(handlers::mint::<Q, S>).route_layer(axum::middleware::from_fn_with_state(
                Arc::clone(&state),
                middleware::api_key_auth::<Q, S>,
            )),
        )
        .route("/checkout", get(handlers::checkout::<Q, S>))
        .route("/health", get(handlers::health::<Q, S>))
        .route("/metrics", get(handlers::metrics::<Q, S>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .map_response(|res: axum::http::Response<_>| res.map(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .map_request(|req: axum::http::Request<_>| req.map(axum::body::Body::new))
                .layer(axum::middleware::from_fn(middleware::inject_request_id)),
        )
        .with_state(state)
}
