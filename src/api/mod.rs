//! Remote gateway to the lending service
//!
//! The server is the source of truth for the catalog and for every
//! borrow-request field; these endpoint clients are the only place that
//! speaks HTTP. Services depend on the traits, not the HTTP types, so
//! tests can substitute the gateway wholesale.

pub mod auth;
pub mod catalog;
pub mod profile;
pub mod requests;
pub mod transport;

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ClientResult;
use crate::models::{
    Book, BookId, BookQuery, BookRequest, Credential, RequestId, Stream, StudentProfile,
};

pub use transport::Transport;

/// Credential issuance and account flows (owned by the auth collaborator).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, form: &auth::LoginForm) -> ClientResult<Credential>;
    async fn register(&self, form: &auth::RegisterForm) -> ClientResult<auth::RegisteredAccount>;
    async fn change_password(
        &self,
        credential: &Credential,
        form: &auth::PasswordChangeForm,
    ) -> ClientResult<Option<String>>;
}

/// Catalog endpoints. Every call is authorized; a call without a
/// credential is unrepresentable.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_streams(&self, credential: &Credential) -> ClientResult<Vec<Stream>>;
    async fn search_books(
        &self,
        credential: &Credential,
        query: &BookQuery,
    ) -> ClientResult<Vec<Book>>;
}

/// Borrow-request endpoints.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RequestsApi: Send + Sync {
    async fn list_requests(&self, credential: &Credential) -> ClientResult<Vec<BookRequest>>;
    /// The server batches creates and answers with the list of created
    /// requests, even for a single submission.
    async fn create_request(
        &self,
        credential: &Credential,
        book: BookId,
    ) -> ClientResult<Vec<BookRequest>>;
    async fn return_request(
        &self,
        credential: &Credential,
        id: RequestId,
    ) -> ClientResult<BookRequest>;
}

/// Student profile endpoints (opaque collaborator).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn get_profile(&self, credential: &Credential) -> ClientResult<StudentProfile>;
    async fn update_profile(
        &self,
        credential: &Credential,
        update: &profile::ProfileUpdate,
    ) -> ClientResult<StudentProfile>;
}

/// All endpoint clients wired over one shared transport.
#[derive(Clone)]
pub struct Api {
    pub auth: Arc<dyn AuthApi>,
    pub catalog: Arc<dyn CatalogApi>,
    pub requests: Arc<dyn RequestsApi>,
    pub profile: Arc<dyn ProfileApi>,
}

impl Api {
    pub fn new(transport: Transport) -> Self {
        Self {
            auth: Arc::new(auth::HttpAuthApi::new(transport.clone())),
            catalog: Arc::new(catalog::HttpCatalogApi::new(transport.clone())),
            requests: Arc::new(requests::HttpRequestsApi::new(transport.clone())),
            profile: Arc::new(profile::HttpProfileApi::new(transport)),
        }
    }
}
