#![forbid(unsafe_code)]

mod config;
mod error;
mod http;

pub use config::ServerConfig;
pub use error::ApiError;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use verkove_core::{EntityStore, ImageStore};
use verkove_studio::{ChatEngine, IterationEngine, ManufacturingExport, ProviderClient};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EntityStore>,
    pub images: Arc<ImageStore>,
    pub iterations: Arc<IterationEngine>,
    pub chat: Arc<ChatEngine>,
    pub export: Arc<ManufacturingExport>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the engines over one store. `fetch_timeout` bounds fetching of
    /// remote reference images.
    pub fn new(
        config: ServerConfig,
        store: Arc<EntityStore>,
        provider: Option<Arc<dyn ProviderClient>>,
        fetch_timeout: Duration,
    ) -> Self {
        let images = Arc::new(ImageStore::new(&config.uploads_dir));
        Self {
            iterations: Arc::new(IterationEngine::new(
                store.clone(),
                images.clone(),
                provider.clone(),
                fetch_timeout,
            )),
            chat: Arc::new(ChatEngine::new(
                store.clone(),
                images.clone(),
                provider,
                fetch_timeout,
            )),
            export: Arc::new(ManufacturingExport::new(store.clone())),
            store,
            images,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/base-designs", get(http::catalog::list_base_designs))
        .route("/base-designs/:id", get(http::catalog::get_base_design))
        .route("/sub-designs", get(http::catalog::list_sub_designs))
        .route(
            "/projects",
            get(http::projects::list_projects).post(http::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(http::projects::get_project).patch(http::projects::update_project),
        )
        .route("/orders", get(http::projects::list_orders))
        .route(
            "/orders/:id",
            get(http::projects::get_order).patch(http::projects::update_order),
        )
        .route("/generate-design", post(http::studio::generate_design))
        .route("/chat", post(http::studio::chat))
        .route("/export-design/:project_id", post(http::studio::export_design))
        .route("/upload", post(http::uploads::upload_image))
        .layer(middleware::from_fn(http::request_log::log_api_request));

    Router::new()
        .route("/healthz", get(http::healthz))
        .route("/uploads/:file", get(http::uploads::serve_upload))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}
