//! Book catalog service

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookList, Pagination},
        Book, BookQuery, CreateBook, UpdateBook,
    },
    repository::books::BookStore,
};

#[derive(Clone)]
pub struct BooksService {
    books: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    /// Search books with pagination
    pub async fn list(&self, access_token: &str, query: &BookQuery) -> AppResult<BookList> {
        let (data, total) = self.books.list(access_token, query).await?;
        Ok(BookList {
            data,
            pagination: Pagination::new(query.page, query.page_size, total),
        })
    }

    /// Add a book; the ISBN must not be catalogued already
    pub async fn add(&self, access_token: &str, mut book: CreateBook) -> AppResult<Book> {
        book.isbn = book.isbn.trim().to_string();
        let isbn = book.isbn.as_str();
        if let Some(existing) = self.books.find_by_isbn(access_token, isbn).await? {
            tracing::info!(isbn, existing_id = %existing.id, "Rejecting duplicate ISBN");
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                isbn
            )));
        }

        let created = self.books.insert(access_token, &book).await?;
        tracing::info!(id = %created.id, title = %created.title, "Book added");
        Ok(created)
    }

    /// Replace a book's fields and stamp `update_time`
    pub async fn update(&self, access_token: &str, book: UpdateBook) -> AppResult<Book> {
        let (id, changes) = book.into_changes(Utc::now());
        let updated = self
            .books
            .update(access_token, &id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        tracing::info!(id = %updated.id, "Book updated");
        Ok(updated)
    }

    /// Delete a book, returning the removed record
    pub async fn delete(&self, access_token: &str, id: &str) -> AppResult<Book> {
        let deleted = self
            .books
            .delete(access_token, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        tracing::info!(id = %deleted.id, title = %deleted.title, "Book deleted");
        Ok(deleted)
    }
}
