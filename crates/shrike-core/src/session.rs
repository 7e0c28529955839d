use crate::config::Credentials;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a session driver.
///
/// `Auth` is fatal and aborts the run before any row is processed; `Nav` and
/// `Timeout` are absorbed at the row boundary so one bad URL cannot sink the
/// whole run.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("login failed: {0}")]
    Auth(String),

    #[error("navigation failed: {0}")]
    Nav(String),

    #[error("page did not settle within {0:?}")]
    Timeout(Duration),
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Auth(_))
    }
}

/// The browser capability the pipeline drives. Exactly one authenticated
/// session serves a run; rows are visited sequentially through it.
#[async_trait]
pub trait SessionDriver: Send {
    /// Establish an authenticated session. Called once, before any row.
    async fn login(&mut self, credentials: &Credentials) -> Result<(), SessionError>;

    /// Navigate to `url` and return the page content once the load settles.
    async fn page_text(&mut self, url: &str) -> Result<String, SessionError>;
}
