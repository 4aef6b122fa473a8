//! Shared HTTP client and request pipeline.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::ApiError;
use super::interceptor::{self, BodyKind};
use crate::config::ClientConfig;
use crate::session::SessionContext;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// RadaPOS backend client.
///
/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base: Url,
    session: SessionContext,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

enum Body {
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

impl Body {
    const fn kind(&self) -> BodyKind {
        match self {
            Self::Empty => BodyKind::Empty,
            Self::Json(_) => BodyKind::Json,
            Self::Multipart(_) => BodyKind::Multipart,
        }
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self, ApiError> {
        Self::build(config.api_url.clone(), config.http_timeout, session)
    }

    /// Create a client for `base` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_base_url(base: Url, session: SessionContext) -> Result<Self, ApiError> {
        Self::build(base, DEFAULT_TIMEOUT, session)
    }

    fn build(mut base: Url, timeout: Duration, session: SessionContext) -> Result<Self, ApiError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base,
                session,
            }),
        })
    }

    /// Base URL every endpoint path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Session shared with the interceptors.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// A leading `/` is ignored so the base path (e.g. `/api/`) is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidPath`] if the result is not a valid URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::InvalidPath(path.to_owned()))
    }

    /// Send one request through both interceptors.
    async fn send(&self, method: Method, url: Url, body: Body) -> Result<Response, ApiError> {
        let endpoint = url.path().to_owned();
        let credential = self.inner.session.stored_credential()?;
        let headers = interceptor::request_headers(credential.as_ref(), body.kind())?;

        debug!(%method, %endpoint, authenticated = credential.is_some(), "Sending request");

        let request = self.inner.http.request(method, url).headers(headers);
        let request = match body {
            Body::Empty => request,
            Body::Json(value) => request.body(value.to_string()),
            Body::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await?;
        interceptor::check_response(&self.inner.session, &endpoint, response).await
    }

    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        // Bodiless success responses decode as JSON null.
        let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(bytes).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_owned(),
            source,
        })
    }

    fn to_json<B: Serialize>(path: &str, body: &B) -> Result<Body, ApiError> {
        serde_json::to_value(body)
            .map(Body::Json)
            .map_err(|source| ApiError::Encode {
                endpoint: path.to_owned(),
                source,
            })
    }

    /// `GET` a JSON document.
    #[instrument(skip(self))]
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, self.url(path)?, Body::Empty).await?;
        Self::decode(path, response).await
    }

    /// `GET` a binary download (receipts, exports).
    #[instrument(skip(self))]
    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.send(Method::GET, self.url(path)?, Body::Empty).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST` a JSON body.
    #[instrument(skip(self, body))]
    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::to_json(path, body)?;
        let response = self.send(Method::POST, self.url(path)?, body).await?;
        Self::decode(path, response).await
    }

    /// `POST` without a body.
    #[instrument(skip(self))]
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::POST, self.url(path)?, Body::Empty).await?;
        Self::decode(path, response).await
    }

    /// `POST` a multipart form.
    #[instrument(skip(self, form))]
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let response = self
            .send(Method::POST, self.url(path)?, Body::Multipart(form))
            .await?;
        Self::decode(path, response).await
    }

    /// `PUT` a JSON body.
    #[instrument(skip(self, body))]
    pub(crate) async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::to_json(path, body)?;
        let response = self.send(Method::PUT, self.url(path)?, body).await?;
        Self::decode(path, response).await
    }

    /// `PUT` without a body.
    #[instrument(skip(self))]
    pub(crate) async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::PUT, self.url(path)?, Body::Empty).await?;
        Self::decode(path, response).await
    }

    /// `PUT` a multipart form.
    #[instrument(skip(self, form))]
    pub(crate) async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let response = self
            .send(Method::PUT, self.url(path)?, Body::Multipart(form))
            .await?;
        Self::decode(path, response).await
    }

    /// `PATCH` a JSON body.
    #[instrument(skip(self, body))]
    pub(crate) async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::to_json(path, body)?;
        let response = self.send(Method::PATCH, self.url(path)?, body).await?;
        Self::decode(path, response).await
    }

    /// `DELETE` a resource.
    #[instrument(skip(self))]
    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::DELETE, self.url(path)?, Body::Empty).await?;
        Self::decode(path, response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn client(base: &str) -> ApiClient {
        let session = SessionContext::new(Arc::new(MemoryStore::new()));
        ApiClient::with_base_url(Url::parse(base).unwrap(), session).unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let api = client("http://localhost:5555/api");
        assert_eq!(
            api.url("/products/vendor").unwrap().as_str(),
            "http://localhost:5555/api/products/vendor"
        );
        assert_eq!(
            api.url("notifications/").unwrap().as_str(),
            "http://localhost:5555/api/notifications/"
        );
    }

    #[test]
    fn test_url_at_root() {
        let api = client("http://127.0.0.1:5555");
        assert_eq!(
            api.url("/auth/login").unwrap().as_str(),
            "http://127.0.0.1:5555/auth/login"
        );
    }
}
