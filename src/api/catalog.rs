//! Catalog endpoints

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::{Book, BookQuery, Credential, Stream};

use super::{CatalogApi, Transport};

pub struct HttpCatalogApi {
    transport: Transport,
}

impl HttpCatalogApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_streams(&self, credential: &Credential) -> ClientResult<Vec<Stream>> {
        self.transport.get("/streams/", credential, &[]).await
    }

    async fn search_books(
        &self,
        credential: &Credential,
        query: &BookQuery,
    ) -> ClientResult<Vec<Book>> {
        self.transport
            .get("/books/", credential, &query.query_pairs())
            .await
    }
}
