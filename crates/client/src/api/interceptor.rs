//! Request/response interceptor pair applied to every backend call.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{error, warn};

use super::ApiError;
use crate::session::SessionContext;

/// Shape of the outgoing body, as far as headers are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// No body (GET, DELETE, bodiless POST).
    Empty,
    /// JSON document.
    Json,
    /// `multipart/form-data`; the transport adds the boundary.
    Multipart,
}

/// Build headers for an outgoing request.
///
/// - a stored credential becomes `Authorization: Bearer <token>`
/// - multipart bodies get no forced `Content-Type`
/// - everything else is sent as `application/json`
///
/// # Errors
///
/// Returns [`ApiError::InvalidCredential`] if the token contains bytes that
/// are not allowed in a header.
pub fn request_headers(
    credential: Option<&SecretString>,
    body: BodyKind,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();

    if let Some(token) = credential {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| ApiError::InvalidCredential)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    if body != BodyKind::Multipart {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(headers)
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Pull a human-readable message out of an error body.
///
/// The backend is inconsistent: `msg`, `error` and `message` all occur.
/// Falls back to the raw text, then to the status reason.
#[must_use]
pub fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| {
        b.msg.or(b.message).or_else(|| match b.error {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
            None => None,
        })
    });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<'))
                .then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned())
}

/// Inspect a response before it reaches the caller.
///
/// A 401 from any endpoint ends the session (both persisted keys are
/// removed and listeners are sent to the login entry point) and becomes
/// [`ApiError::Unauthorized`]. Other failures are passed through as
/// [`ApiError::Status`]. Successful responses are returned untouched.
///
/// # Errors
///
/// See above.
pub async fn check_response(
    session: &SessionContext,
    endpoint: &str,
    response: Response,
) -> Result<Response, ApiError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        warn!(endpoint, "Backend rejected credential, ending session");
        if let Err(e) = session.expire() {
            error!(error = %e, "Failed to clear persisted session");
        }
        return Err(ApiError::Unauthorized);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        warn!(endpoint, %status, %message, "Backend returned an error");
        return Err(ApiError::Status { status, message });
    }

    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_attached_when_credential_present() {
        let token = SecretString::from("abc.def");
        let headers = request_headers(Some(&token), BodyKind::Json).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc.def");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_no_authorization_without_credential() {
        let headers = request_headers(None, BodyKind::Empty).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_multipart_leaves_content_type_to_transport() {
        let token = SecretString::from("abc");
        let headers = request_headers(Some(&token), BodyKind::Multipart).unwrap();
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert!(headers.get(AUTHORIZATION).is_some());
    }

    #[test]
    fn test_invalid_credential() {
        let token = SecretString::from("bad\ntoken");
        assert!(matches!(
            request_headers(Some(&token), BodyKind::Json),
            Err(ApiError::InvalidCredential)
        ));
    }

    #[test]
    fn test_error_message_variants() {
        let s = StatusCode::BAD_REQUEST;
        assert_eq!(error_message(s, r#"{"msg":"Insufficient funds"}"#), "Insufficient funds");
        assert_eq!(error_message(s, r#"{"error":"Missing fields"}"#), "Missing fields");
        assert_eq!(error_message(s, r#"{"message":"Nope"}"#), "Nope");
        assert_eq!(error_message(s, "plain text"), "plain text");
        assert_eq!(error_message(s, "<html>boom</html>"), "Bad Request");
        assert_eq!(error_message(s, ""), "Bad Request");
    }
}
