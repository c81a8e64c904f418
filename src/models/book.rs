//! Book record model and request payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Circulation status; serialized as its integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
#[repr(i16)]
pub enum BookStatus {
    Borrowed = 0,
    Available = 1,
}

impl TryFrom<i16> for BookStatus {
    type Error = String;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(BookStatus::Borrowed),
            1 => Ok(BookStatus::Available),
            other => Err(format!("invalid book status {}, expected 0 or 1", other)),
        }
    }
}

impl From<BookStatus> for i16 {
    fn from(status: BookStatus) -> Self {
        status as i16
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Available
    }
}

impl BookStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BookStatus::Borrowed => "Borrowed",
            BookStatus::Available => "Available",
        }
    }
}

/// Book row as stored in the remote `books` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub quantity: i32,
    #[schema(value_type = i16)]
    pub status: BookStatus,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

fn default_quantity() -> i32 {
    1
}

/// Add book request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    #[schema(value_type = i16)]
    pub status: BookStatus,
}

/// Update book request; every field is replaced
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Book id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    #[schema(value_type = i16)]
    pub status: BookStatus,
}

/// Column values written by an update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookChanges {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub quantity: i32,
    pub status: BookStatus,
    pub update_time: DateTime<Utc>,
}

impl UpdateBook {
    /// Split into the target id and the columns to write
    pub fn into_changes(self, now: DateTime<Utc>) -> (String, BookChanges) {
        (
            self.id,
            BookChanges {
                title: self.title,
                author: self.author,
                isbn: self.isbn,
                category: self.category,
                quantity: self.quantity,
                status: self.status,
                update_time: now,
            },
        )
    }
}

/// Delete book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DeleteBook {
    #[validate(length(min = 1, message = "Book id is required"))]
    pub id: String,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

/// Book list query (search + pagination)
#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            title: None,
            author: None,
            category: None,
        }
    }
}

impl BookQuery {
    /// Inclusive row window `(from, to)` for the requested page
    pub fn range(&self) -> (i64, i64) {
        let from = (self.page - 1).saturating_mul(self.page_size);
        (from, from.saturating_add(self.page_size - 1))
    }

    /// Search filters with blank values dropped
    pub fn filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", self.title.as_deref()),
            ("author", self.author.as_deref()),
            ("category", self.category.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (column, v))
        })
        .collect()
    }
}

/// Pagination block of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if page_size > 0 {
            total / page_size + i64::from(total % page_size != 0)
        } else {
            0
        };
        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// Paginated book list response
#[derive(Debug, Serialize, ToSchema)]
pub struct BookList {
    pub data: Vec<Book>,
    pub pagination: Pagination,
}

/// Generic message response
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Mutation response with the stored record
#[derive(Debug, Serialize, ToSchema)]
pub struct BookResponse {
    pub message: String,
    pub data: Book,
}
