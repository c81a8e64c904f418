//! Books table transport (PostgREST HTTP API)

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::{
    config::BackendConfig,
    error::{AppError, AppResult},
    models::{book::BookChanges, Book, BookQuery, CreateBook},
};

const TABLE: &str = "books";

/// Row operations on the remote `books` table.
///
/// Every call carries the signed-in user's access token so row policies on
/// the remote side apply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// One page of books, newest first, with the total match count
    async fn list(&self, access_token: &str, query: &BookQuery) -> AppResult<(Vec<Book>, i64)>;

    async fn find_by_isbn(&self, access_token: &str, isbn: &str) -> AppResult<Option<Book>>;

    async fn insert(&self, access_token: &str, book: &CreateBook) -> AppResult<Book>;

    /// Returns `None` when no row has this id
    async fn update(&self, access_token: &str, id: &str, changes: &BookChanges) -> AppResult<Option<Book>>;

    /// Returns the deleted row, `None` when no row has this id
    async fn delete(&self, access_token: &str, id: &str) -> AppResult<Option<Book>>;
}

#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Total row count from a `Content-Range` header (`0-9/42`, `*/0`)
pub fn parse_total(content_range: &str) -> Option<i64> {
    let (_, total) = content_range.split_once('/')?;
    total.trim().parse().ok()
}

#[derive(Clone)]
pub struct RestBookStore {
    http: Client,
    table_url: String,
    anon_key: String,
}

impl RestBookStore {
    pub fn new(http: Client, config: &BackendConfig) -> Self {
        Self {
            http,
            table_url: format!("{}/rest/v1/{}", config.url.trim_end_matches('/'), TABLE),
            anon_key: config.anon_key.clone(),
        }
    }

    fn request(&self, method: Method, access_token: &str) -> RequestBuilder {
        self.http
            .request(method, &self.table_url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    async fn error_from(response: Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: PostgrestError = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed.message.unwrap_or_else(|| status.to_string());

        // unique_violation
        if parsed.code.as_deref() == Some("23505") {
            return AppError::Conflict(parsed.details.unwrap_or(message));
        }
        tracing::error!(%status, code = ?parsed.code, "Books table request failed: {}", message);
        AppError::Backend(format!("Books table request failed: {}", message))
    }

    async fn rows(response: Response) -> AppResult<Vec<Book>> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json::<Vec<Book>>().await?)
    }

    async fn first_where(&self, access_token: &str, column: &str, value: &str) -> AppResult<Option<Book>> {
        let response = self
            .request(Method::GET, access_token)
            .query(&[("select", "*".to_string()), (column, format!("eq.{}", value))])
            .query(&[("limit", "1")])
            .send()
            .await?;
        Ok(Self::rows(response).await?.into_iter().next())
    }
}

#[async_trait]
impl BookStore for RestBookStore {
    async fn list(&self, access_token: &str, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let (from, to) = query.range();
        let mut params = vec![
            ("select", "*".to_string()),
            ("order", "create_time.desc".to_string()),
        ];
        for (column, value) in query.filters() {
            params.push((column, format!("ilike.*{}*", value)));
        }

        let response = self
            .request(Method::GET, access_token)
            .query(&params)
            .header("Range-Unit", "items")
            .header(header::RANGE, format!("{}-{}", from, to))
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let status = response.status();
        let total = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total);

        // Page past the end: no rows, total still reported
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok((Vec::new(), total.unwrap_or(0)));
        }

        let books = Self::rows(response).await?;
        let total = total.unwrap_or(books.len() as i64);
        Ok((books, total))
    }

    async fn find_by_isbn(&self, access_token: &str, isbn: &str) -> AppResult<Option<Book>> {
        self.first_where(access_token, "isbn", isbn).await
    }

    async fn insert(&self, access_token: &str, book: &CreateBook) -> AppResult<Book> {
        let response = self
            .request(Method::POST, access_token)
            .header("Prefer", "return=representation")
            .json(&[book])
            .send()
            .await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("Insert returned no row".to_string()))
    }

    async fn update(&self, access_token: &str, id: &str, changes: &BookChanges) -> AppResult<Option<Book>> {
        let response = self
            .request(Method::PATCH, access_token)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;
        Ok(Self::rows(response).await?.into_iter().next())
    }

    async fn delete(&self, access_token: &str, id: &str) -> AppResult<Option<Book>> {
        let response = self
            .request(Method::DELETE, access_token)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        Ok(Self::rows(response).await?.into_iter().next())
    }
}
