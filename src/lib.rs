//! LMS patron client
//!
//! Client for a library-lending service: patrons authenticate, browse a
//! book catalog filtered by subject stream and free-text search, submit
//! borrow requests, and track each request through its lifecycle
//! (pending, approved, returned, plus a server-computed overdue flag).

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{ClientError, ClientResult};

/// Application state shared across the front end
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
