use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{comments, health, posts};
use crate::middleware::{error_envelope_middleware, handle_panic, jwt_auth_middleware, route_not_found};
use crate::state::AppState;

/// Build the full HTTP surface around `state`
pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(post_routes(state.clone()))
        .merge(comment_routes(state.clone()))
        .fallback(route_not_found)
        // Innermost first: panics become envelopes before the error middleware sees them
        .layer(CatchPanicLayer::custom(handle_panic))
        // Json has its own 2MB default; both limits follow the config
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(middleware::from_fn_with_state(state.clone(), error_envelope_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn post_routes(state: AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state, jwt_auth_middleware);

    Router::new()
        .route("/posts", get(posts::list).post(posts::create.layer(auth.clone())))
        .route(
            "/posts/:postId",
            get(posts::get)
                .patch(posts::update.layer(auth.clone()))
                .delete(posts::delete.layer(auth)),
        )
}

fn comment_routes(state: AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state, jwt_auth_middleware);

    Router::new()
        .route(
            "/posts/:postId/comments",
            get(comments::list).post(comments::create.layer(auth.clone())),
        )
        .route(
            "/comments/:commentId",
            patch(comments::update.layer(auth.clone())).delete(comments::delete.layer(auth)),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}
