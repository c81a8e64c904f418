//! Bookshelf Server
//!
//! Library book inventory backed by a hosted auth + table service. The server
//! propagates the session cookie on every request, gates protected pages and
//! exposes the book catalog as a JSON API and as server-rendered pages.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod repository;
pub mod services;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use crate::{gate::GateRules, repository::Repository, services::Services};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: Repository,
    pub services: Arc<Services>,
    pub gate: Arc<GateRules>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Repository) -> Self {
        let services = Services::new(repository.clone(), &config);
        Self {
            gate: Arc::new(GateRules::from_config(&config.routes)),
            services: Arc::new(services),
            repository,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // User session
        .route("/user/login", post(api::users::login))
        .route("/user/register", post(api::users::register))
        .route("/user/logout", post(api::users::logout))
        // Books, action style
        .route("/book/getList", post(api::books::get_list))
        .route("/book/add", post(api::books::add_book))
        .route("/book/update", post(api::books::update_book))
        .route("/book/delete", post(api::books::delete_book))
        // Books, REST style
        .route(
            "/book",
            get(api::books::list_books)
                .post(api::books::add_book)
                .put(api::books::update_book)
                .delete(api::books::delete_book),
        );

    let pages = Router::new()
        .route("/", get(api::pages::landing))
        .route("/user/login", get(api::pages::login_page).post(api::pages::login_submit))
        .route(
            "/user/register",
            get(api::pages::register_page).post(api::pages::register_submit),
        )
        .route("/user/logout", post(api::pages::logout_submit))
        .route("/dashboard", get(api::pages::dashboard))
        .route("/dashboard/booksManagement/list", get(api::pages::books_list));

    let gated = Router::new()
        .nest("/api", api_routes)
        .merge(pages)
        .layer(middleware::from_fn_with_state(state.clone(), gate::session_gate))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    gated
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
