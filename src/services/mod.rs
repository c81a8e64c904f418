//! Business logic services

pub mod auth;
pub mod auth_events;
pub mod books;
pub mod cookies;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

use self::{
    auth::{AuthClient, SessionSettings},
    cookies::CookieStore,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub session: Arc<SessionSettings>,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            books: books::BooksService::new(Arc::clone(&repository.books)),
            session: Arc::new(SessionSettings::from_config(config)),
            repository,
        }
    }

    /// Auth client bound to one cookie store (a request's jar, or the
    /// process-wide jar on the client side)
    pub fn auth_client(&self, cookies: Arc<dyn CookieStore>) -> AuthClient {
        AuthClient::new(
            Arc::clone(&self.repository.auth),
            cookies,
            Arc::clone(&self.session),
        )
    }
}
