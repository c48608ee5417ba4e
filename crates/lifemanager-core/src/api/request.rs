use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::ApiError;

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Text(String),
    /// Content type (with boundary) is set by the multipart encoder
    Multipart(multipart::Form),
}

/// Per-call options for `ApiClient::call`.
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    /// Replace the defaults (`Authorization`, `Content-Type`) when names collide
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: RequestBody) -> Self {
        Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn post_json<T: Serialize + ?Sized>(payload: &T) -> Result<Self, ApiError> {
        Ok(Self::post(RequestBody::Json(serde_json::to_value(payload)?)))
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Response of an authenticated call.
///
/// Returned for every status, including 401; `unauthorized` tells the caller
/// whether the session should be dropped.
#[derive(Debug)]
pub struct ApiResponse {
    pub unauthorized: bool,
    inner: reqwest::Response,
}

impl ApiResponse {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self {
            unauthorized: inner.status() == StatusCode::UNAUTHORIZED,
            inner,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub async fn text(self) -> Result<String, ApiError> {
        Ok(self.inner.text().await?)
    }

    pub async fn bytes(self) -> Result<Vec<u8>, ApiError> {
        Ok(self.inner.bytes().await?.to_vec())
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let bytes = self.inner.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Turn a non-2xx response into the matching `ApiError`, body included.
    pub async fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            let status = self.status();
            let body = self.inner.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}
