use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// HTTP header carrying the recommendation session id
pub const SESSION_ID_HEADER: &str = "x-session-id";

const MAX_SESSION_ID_LEN: usize = 128;

/// Extension type for storing the session id in request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    /// Creates a new random session id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts client-supplied ids made of ASCII letters, digits, `-` and `_`
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SESSION_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Middleware that resolves the session id and adds it to the request extensions.
/// Also echoes the session id in the response headers.
///
/// A well-formed `x-session-id` header is kept as is. Otherwise a new UUID v4
/// is generated, which starts a new session for the client.
pub async fn session_id_middleware(mut request: Request, next: Next) -> Response {
    let session_id = request
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(SessionId::parse)
        .unwrap_or_else(SessionId::new);

    request.extensions_mut().insert(session_id.clone());

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(session_id.as_str()) {
        response
            .headers_mut()
            .insert(SESSION_ID_HEADER, header_value);
    }

    response
}

/// Creates the per-request tracing span, tagged with the session id
pub fn make_span_with_session_id(request: &Request<Body>) -> tracing::Span {
    let session_id = request
        .extensions()
        .get::<SessionId>()
        .map(|id| id.as_str())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        session_id = %session_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_uuid_and_slug() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(SessionId::parse(&id), Some(SessionId(id.clone())));
        assert!(SessionId::parse("user_42-tab").is_some());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(SessionId::parse(""), None);
        assert_eq!(SessionId::parse("has space"), None);
        assert_eq!(SessionId::parse("feed:session:x"), None);
        assert_eq!(SessionId::parse(&"a".repeat(MAX_SESSION_ID_LEN + 1)), None);
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
