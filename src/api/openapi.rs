//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Library book inventory REST API. Requests are authenticated by the session cookie set on sign-in.",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // User
        users::login,
        users::register,
        users::logout,
        // Books
        books::get_list,
        books::list_books,
        books::add_book,
        books::update_book,
        books::delete_book,
    ),
    components(
        schemas(
            // User
            crate::models::User,
            crate::models::user::LoginRequest,
            crate::models::user::RegisterRequest,
            // Books
            crate::models::Book,
            crate::models::BookQuery,
            crate::models::CreateBook,
            crate::models::UpdateBook,
            crate::models::DeleteBook,
            crate::models::book::Pagination,
            crate::models::book::BookList,
            crate::models::book::BookResponse,
            crate::models::book::MessageResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "user", description = "Sign-in, registration and sign-out"),
        (name = "books", description = "Book inventory management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
