//! # api-adapters
//!
//! The HTTP routing and orchestration layer for the symbol library.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod metrics;
#[cfg(feature = "web-axum")]
pub mod middleware;

#[cfg(feature = "web-axum")]
pub use web::*;

#[cfg(feature = "web-axum")]
mod web {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::extract::DefaultBodyLimit;
    use axum::routing::{get, put};
    use axum::Router;
    use services::ContentService;
    use tower::ServiceBuilder;
    use tower_http::services::ServeDir;

    use crate::metrics::{self, Metrics};
    use crate::{handlers, middleware};

    /// Largest accepted thumbnail upload.
    const THUMBNAIL_BODY_LIMIT: usize = 10 * 1024 * 1024;

    /// State shared across all request handlers.
    #[derive(Clone)]
    pub struct AppState {
        pub content: Arc<ContentService>,
        pub metrics: Arc<Metrics>,
    }

    impl AppState {
        pub fn new(content: ContentService) -> Self {
            Self {
                content: Arc::new(content),
                metrics: Arc::new(Metrics::new()),
            }
        }
    }

    /// Where uploaded files are served from.
    #[derive(Debug, Clone)]
    pub struct UploadMount {
        /// URL path prefix, e.g. "/uploads". Absolute URLs (a CDN) are not mounted.
        pub url_prefix: String,
        pub dir: PathBuf,
    }

    /// Builds the `/api/v1` routes.
    pub fn api_routes(state: AppState) -> Router {
        Router::new()
            .route(
                "/symbols",
                get(handlers::list_symbols).post(handlers::create_symbol),
            )
            .route(
                "/symbols/{id}",
                get(handlers::get_symbol)
                    .post(handlers::update_symbol)
                    .put(handlers::update_symbol)
                    .patch(handlers::update_symbol)
                    .delete(handlers::delete_symbol),
            )
            .route(
                "/symbols/{id}/thumbnail",
                put(handlers::upload_thumbnail).layer(DefaultBodyLimit::max(THUMBNAIL_BODY_LIMIT)),
            )
            .route(
                "/symbol-categories",
                get(handlers::list_categories).post(handlers::create_category),
            )
            .route(
                "/symbol-categories/{id}",
                get(handlers::get_category).delete(handlers::delete_category),
            )
            .route_layer(axum::middleware::from_fn_with_state(
                state.metrics.clone(),
                metrics::track,
            ))
            .with_state(state)
    }

    /// The full application: API, health, metrics and static thumbnails.
    pub fn router(state: AppState, uploads: Option<UploadMount>) -> Router {
        let mut app = Router::new()
            .nest("/api/v1", api_routes(state.clone()))
            .route("/health", get(handlers::health))
            .route(
                "/metrics",
                get(metrics::metrics_handler).with_state(state.metrics.clone()),
            );

        if let Some(mount) = uploads.filter(|m| m.url_prefix.starts_with('/')) {
            let prefix = mount.url_prefix.trim_end_matches('/').to_string();
            if !prefix.is_empty() {
                app = app.nest_service(&prefix, ServeDir::new(mount.dir));
            }
        }

        app.layer(
            ServiceBuilder::new()
                .layer(middleware::set_request_id())
                .layer(middleware::trace_layer())
                .layer(middleware::propagate_request_id())
                .layer(middleware::compression())
                .layer(middleware::cors_policy()),
        )
    }
}
