//! Repository layer: transports to the hosted backend

pub mod auth;
pub mod books;

use std::{sync::Arc, time::Duration};

use reqwest::Client;

use crate::{
    config::BackendConfig,
    error::{AppError, AppResult},
};

use self::{
    auth::{AuthBackend, GoTrueBackend},
    books::{BookStore, RestBookStore},
};

/// Main repository struct holding the remote transports.
///
/// Stateless apart from the shared connection pool; cheap to clone.
#[derive(Clone)]
pub struct Repository {
    pub auth: Arc<dyn AuthBackend>,
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    /// Create the transports over one shared HTTP connection pool
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            auth: Arc::new(GoTrueBackend::new(http.clone(), config)),
            books: Arc::new(RestBookStore::new(http, config)),
        })
    }

    /// Assemble from explicit transports (tests, alternative backends)
    pub fn with_backends(auth: Arc<dyn AuthBackend>, books: Arc<dyn BookStore>) -> Self {
        Self { auth, books }
    }
}
