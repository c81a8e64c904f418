//! Book catalog endpoints.
//!
//! Every operation is exposed twice: the action-style `POST /book/<action>`
//! routes and the REST-style `/book` verbs.

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        book::{BookList, BookResponse, MessageResponse},
        BookQuery, CreateBook, DeleteBook, UpdateBook,
    },
    AppState,
};

use super::{SessionContext, ValidatedJson, ValidatedQuery};

/// List books with search and pagination
#[utoipa::path(
    post,
    path = "/book/getList",
    tag = "books",
    request_body = BookQuery,
    responses(
        (status = 200, description = "Page of books", body = BookList),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_list(
    State(state): State<AppState>,
    session: SessionContext,
    ValidatedJson(query): ValidatedJson<BookQuery>,
) -> AppResult<Json<BookList>> {
    let caller = session.require_user()?;
    let list = state.services.books.list(&caller.access_token, &query).await?;
    Ok(Json(list))
}

/// List books with search and pagination (query string)
#[utoipa::path(
    get,
    path = "/book",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books", body = BookList),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<BookQuery>,
    session: SessionContext,
) -> AppResult<Json<BookList>> {
    let caller = session.require_user()?;
    let list = state.services.books.list(&caller.access_token, &query).await?;
    Ok(Json(list))
}

/// Add a book
#[utoipa::path(
    post,
    path = "/book/add",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 200, description = "Book added", body = BookResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN already catalogued", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    session: SessionContext,
    ValidatedJson(book): ValidatedJson<CreateBook>,
) -> AppResult<Json<BookResponse>> {
    let caller = session.require_user()?;
    let created = state.services.books.add(&caller.access_token, book).await?;
    Ok(Json(BookResponse {
        message: "Book added".to_string(),
        data: created,
    }))
}

/// Update a book
#[utoipa::path(
    post,
    path = "/book/update",
    tag = "books",
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    session: SessionContext,
    ValidatedJson(book): ValidatedJson<UpdateBook>,
) -> AppResult<Json<BookResponse>> {
    let caller = session.require_user()?;
    let updated = state.services.books.update(&caller.access_token, book).await?;
    Ok(Json(BookResponse {
        message: format!("Book \"{}\" updated", updated.title),
        data: updated,
    }))
}

/// Delete a book
#[utoipa::path(
    post,
    path = "/book/delete",
    tag = "books",
    request_body = DeleteBook,
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    session: SessionContext,
    ValidatedJson(request): ValidatedJson<DeleteBook>,
) -> AppResult<Json<MessageResponse>> {
    let caller = session.require_user()?;
    let deleted = state.services.books.delete(&caller.access_token, &request.id).await?;
    Ok(Json(MessageResponse {
        message: format!("Book \"{}\" deleted", deleted.title),
    }))
}
