//! API client for communicating with the Life Manager REST API.
//!
//! This module provides the `ApiClient` struct for the login exchange and
//! for bearer-authenticated requests against the `/api/v1` routes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{multipart, Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::config::Config;
use crate::models::{DocumentFile, NewDocument};

use super::{ApiError, ApiResponse, RequestBody, RequestOptions};

// ============================================================================
// Constants
// ============================================================================

pub const LOGIN_PATH: &str = "/api/v1/auth/login";

pub const PROTECTED_PATH: &str = "/api/v1/auth/protected";

pub const DOCUMENTS_PATH: &str = "/api/v1/documents";

/// Called when an authenticated request comes back 401.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// API client for the Life Manager backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl ApiClient {
    /// Create a new API client against `base_url` (scheme and host, no trailing path needed)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                base_url,
                parsed.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            on_unauthorized: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token.into()),
            on_unauthorized: self.on_unauthorized.clone(),
        }
    }

    /// Invoke `hook` once for every authenticated call that is answered with 401.
    pub fn on_unauthorized(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    /// Absolute URLs pass through, anything else is relative to the base address.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Exchange credentials for a bearer token
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.resolve_url(LOGIN_PATH);
        debug!(url = %url, "Sending login request");

        let response = self.client.post(&url).json(credentials).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let auth: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?;

        if auth.token.is_empty() {
            return Err(ApiError::InvalidResponse("Login response carried an empty token".to_string()));
        }
        Ok(auth.token)
    }

    fn default_headers(&self, body: &RequestBody) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidHeader("bearer token".to_string()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        if !matches!(body, RequestBody::Multipart(_)) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// Issue one request. Every status is returned as a response; only
    /// transport failures are errors. No retries.
    pub async fn call(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        let url = self.resolve_url(path);
        let RequestOptions {
            method,
            headers: overrides,
            body,
        } = options;

        let mut headers = self.default_headers(&body)?;
        for name in overrides.keys() {
            headers.remove(name);
        }
        for (name, value) in overrides.iter() {
            headers.append(name.clone(), value.clone());
        }

        debug!(method = %method, url = %url, "Sending request");
        let request = self.client.request(method, &url).headers(headers);
        let request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.body(serde_json::to_vec(&value)?),
            RequestBody::Text(text) => request.body(text),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = ApiResponse::new(request.send().await?);
        debug!(url = %url, status = %response.status(), "Response received");

        if response.unauthorized {
            warn!(url = %url, "Request unauthorized - token missing, invalid or expired");
            if let Some(ref hook) = self.on_unauthorized {
                hook();
            }
        }

        Ok(response)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.call(path, RequestOptions::get()).await
    }

    /// Token check endpoint; answers a greeting for a valid token.
    pub async fn protected_greeting(&self) -> Result<ApiResponse, ApiError> {
        self.get(PROTECTED_PATH).await
    }

    /// Submit a document as multipart: a `json` part with the metadata and an
    /// optional `file` part the backend reads and summarizes.
    pub async fn submit_document(
        &self,
        document: &NewDocument,
        file: Option<DocumentFile>,
    ) -> Result<ApiResponse, ApiError> {
        let json_part = multipart::Part::text(serde_json::to_string(document)?)
            .mime_str("application/json")
            .map_err(|_| ApiError::InvalidHeader("application/json".to_string()))?;
        let mut form = multipart::Form::new().part("json", json_part);

        if let Some(file) = file {
            let mut part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(mime) = file.mime {
                part = part
                    .mime_str(&mime)
                    .map_err(|_| ApiError::InvalidHeader(mime.clone()))?;
            }
            form = form.part("file", part);
        }

        self.call(DOCUMENTS_PATH, RequestOptions::post(RequestBody::Multipart(form)))
            .await
    }

    /// Submit any serializable payload as a JSON body.
    pub async fn submit_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<ApiResponse, ApiError> {
        self.call(path, RequestOptions::post_json(payload)?).await
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .field("has_unauthorized_hook", &self.on_unauthorized.is_some())
            .finish()
    }
}
