//! HTTP transport and response envelope handling
//!
//! Every response is expected in the `{success, message?, data}` envelope.
//! Anything else (`success` absent on a 2xx, `data` missing where a
//! payload is required) fails closed instead of being unwrapped ad hoc.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult, FieldErrors};
use crate::models::Credential;

#[derive(Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
}

impl Transport {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with bearer credential and query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&credential.access)
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// POST a JSON body. `credential` is `None` only for the
    /// unauthenticated auth endpoints (login, register).
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Option<&Credential>,
        body: &impl Serialize,
    ) -> ClientResult<T> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(credential) = credential {
            request = request.bearer_auth(&credential.access);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// PATCH a JSON body with bearer credential, expecting a `data` payload.
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
        body: &impl Serialize,
    ) -> ClientResult<T> {
        let response = self
            .http
            .patch(self.url(path))
            .bearer_auth(&credential.access)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// PATCH for acknowledge-style endpoints whose success envelope
    /// carries no `data`; yields the server message.
    pub async fn patch_ack(
        &self,
        path: &str,
        credential: &Credential,
        body: &impl Serialize,
    ) -> ClientResult<Option<String>> {
        let response = self
            .http
            .patch(self.url(path))
            .bearer_auth(&credential.access)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let body = Self::json_body(response).await?;
        unwrap_ack(status, &body)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let body = Self::json_body(response).await?;
        let data = unwrap_envelope(status, body)?;
        serde_json::from_value(data).map_err(|e| {
            ClientError::UnexpectedShape(format!("payload does not match the expected shape: {e}"))
        })
    }

    async fn json_body(response: reqwest::Response) -> ClientResult<Value> {
        response
            .json()
            .await
            .map_err(|_| ClientError::UnexpectedShape("response body is not JSON".to_string()))
    }
}

/// Normalize the envelope and extract `data`, failing closed.
pub(crate) fn unwrap_envelope(status: StatusCode, body: Value) -> ClientResult<Value> {
    check_success(status, &body)?;
    match body.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Err(ClientError::UnexpectedShape(
            "envelope has no data".to_string(),
        )),
    }
}

/// Envelope check for responses that acknowledge without a payload.
pub(crate) fn unwrap_ack(status: StatusCode, body: &Value) -> ClientResult<Option<String>> {
    check_success(status, body)?;
    Ok(body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string))
}

fn check_success(status: StatusCode, body: &Value) -> ClientResult<()> {
    if !status.is_success() {
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            message: failure_message(body),
            fields: field_errors(body),
        });
    }
    match body.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        Some(false) => Err(ClientError::Rejected {
            status: status.as_u16(),
            message: failure_message(body),
            fields: field_errors(body),
        }),
        None => Err(ClientError::UnexpectedShape(
            "envelope has no success flag".to_string(),
        )),
    }
}

/// Failure wording: envelope `message`, then the token endpoint's bare
/// `detail`, then a generic fallback.
fn failure_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("detail").and_then(Value::as_str))
        .unwrap_or("Request failed.")
        .to_string()
}

/// Per-field validation messages, when the server put a field map in `data`.
fn field_errors(body: &Value) -> Option<FieldErrors> {
    let map = body.get("data")?.as_object()?;
    let mut fields = FieldErrors::new();
    for (name, value) in map {
        let messages: Vec<String> = match value {
            Value::Array(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Value::String(message) => vec![message.clone()],
            _ => continue,
        };
        if !messages.is_empty() {
            fields.insert(name.clone(), messages);
        }
    }
    (!fields.is_empty()).then_some(fields)
}
