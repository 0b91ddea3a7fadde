use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{permissions, TokenVerifier};
use crate::config::{SecurityConfig, ServerConfig};
use crate::database::DrinkStore;
use crate::handlers;
use crate::middleware::{require_drink_id, require_permission};

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub drinks: Arc<dyn DrinkStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(drinks: Arc<dyn DrinkStore>, verifier: TokenVerifier) -> Self {
        Self {
            drinks,
            verifier: Arc::new(verifier),
        }
    }
}

pub fn router(state: AppState, server: &ServerConfig, security: &SecurityConfig) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .merge(drink_routes(&state))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(server.max_request_size_bytes))
        .layer(cors_layer(security));

    let router = if server.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn drink_routes(state: &AppState) -> Router<AppState> {
    let verifier = &state.verifier;

    Router::new()
        .route(
            "/drinks",
            get(handlers::list_drinks)
                .merge(require_permission(
                    post(handlers::create_drink),
                    verifier,
                    permissions::POST_DRINKS,
                ))
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/drinks-detail",
            require_permission(
                get(handlers::list_drinks_detail),
                verifier,
                permissions::GET_DRINKS_DETAIL,
            )
            .fallback(handlers::method_not_allowed),
        )
        .route(
            "/drinks/:id",
            require_permission(patch(handlers::update_drink), verifier, permissions::PATCH_DRINKS)
                .merge(require_permission(
                    delete(handlers::delete_drink),
                    verifier,
                    permissions::DELETE_DRINKS,
                ))
                // Outermost, so a bad id is 404 even without a token
                .route_layer(from_fn(require_drink_id))
                .fallback(handlers::method_not_allowed),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}
