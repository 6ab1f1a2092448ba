//! Borrow-request endpoints

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ClientResult;
use crate::models::{BookId, BookRequest, Credential, RequestId};

use super::{RequestsApi, Transport};

#[derive(Serialize)]
struct CreateRequestPayload {
    book: BookId,
}

pub struct HttpRequestsApi {
    transport: Transport,
}

impl HttpRequestsApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl RequestsApi for HttpRequestsApi {
    async fn list_requests(&self, credential: &Credential) -> ClientResult<Vec<BookRequest>> {
        self.transport.get("/book-requests/", credential, &[]).await
    }

    async fn create_request(
        &self,
        credential: &Credential,
        book: BookId,
    ) -> ClientResult<Vec<BookRequest>> {
        self.transport
            .post(
                "/book-requests/",
                Some(credential),
                &CreateRequestPayload { book },
            )
            .await
    }

    async fn return_request(
        &self,
        credential: &Credential,
        id: RequestId,
    ) -> ClientResult<BookRequest> {
        self.transport
            .patch(
                &format!("/book-requests/{id}/return/"),
                credential,
                &serde_json::json!({}),
            )
            .await
    }
}
