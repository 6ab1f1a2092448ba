//! Student profile endpoints (opaque collaborator)

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ClientError, ClientResult};
use crate::models::{Credential, StudentProfile};

use super::{ProfileApi, Transport};

/// Profile update payload; only the nested account fields are editable.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub user: AccountUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub struct HttpProfileApi {
    transport: Transport,
}

impl HttpProfileApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn get_profile(&self, credential: &Credential) -> ClientResult<StudentProfile> {
        // The server wraps the caller's profile in a one-element list.
        let profiles: Vec<StudentProfile> =
            self.transport.get("/student/profile/", credential, &[]).await?;
        profiles.into_iter().next().ok_or_else(|| {
            ClientError::UnexpectedShape("profile list is empty".to_string())
        })
    }

    async fn update_profile(
        &self,
        credential: &Credential,
        update: &ProfileUpdate,
    ) -> ClientResult<StudentProfile> {
        self.transport
            .patch("/profile/update/", credential, update)
            .await
    }
}
