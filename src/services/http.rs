// src/services/http.rs
//! Plumbing shared by every API client: base URL joining, bearer tokens and
//! turning non-success responses into `ClientError`s.

use crate::auth::token_store::SharedTokenStore;
use crate::error::{ClientError, ClientResult};
use crate::models::auth::ApiErrorBody;
use reqwest::multipart::Part;
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio_util::io::ReaderStream;

#[derive(Clone)]
pub struct HttpCore {
    client: Client,
    base_url: String,
    tokens: SharedTokenStore,
}

impl HttpCore {
    pub fn new(base_url: &str, tokens: SharedTokenStore) -> Self {
        Self {
            client: Client::new(),
            base_url: crate::config::normalize_base_url(base_url),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    /// Attach `Authorization: Bearer <token>` when a token is stored.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.load() {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                tracing::warn!("Could not read access token, sending request without it: {}", e);
                request
            }
        }
    }
}

/// Percent-encode an id for use in a path, keeping `/` separators intact
/// (remote file ids look like `files/abc123`).
pub fn encode_path_id(id: &str) -> String {
    id.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Multipart part that streams `path` from disk instead of buffering it.
pub async fn file_part(path: &Path, mime: &str) -> ClientResult<Part> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());

    tracing::debug!(file = %file_name, bytes = length, mime, "Streaming upload part");

    let body = Body::wrap_stream(ReaderStream::new(file));
    Ok(Part::stream_with_length(body, length)
        .file_name(file_name)
        .mime_str(mime)?)
}

/// Decode a successful JSON body, or convert a failure status into an error
/// carrying the server's message when it sent one.
pub async fn parse_json<T: DeserializeOwned>(response: Response, action: &str) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(error_from_body(status, &body, action));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", action, e);
        ClientError::Decode(e)
    })
}

pub fn error_from_body(status: StatusCode, body: &str, action: &str) -> ClientError {
    let server_message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(ApiErrorBody::into_message);
    let message = server_message.unwrap_or_else(|| {
        let reason = status.canonical_reason().unwrap_or("request failed");
        format!("{} failed: {}", action, reason)
    });

    tracing::warn!(status = status.as_u16(), "{} request failed: {}", action, message);

    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized(message)
    } else {
        ClientError::Http {
            status: status.as_u16(),
            message,
        }
    }
}
