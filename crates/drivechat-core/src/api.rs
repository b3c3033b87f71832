//! HTTP client for the chatbot backend.
//!
//! Uniform network boundary: every operation takes the bearer token as an
//! explicit parameter, and failures are normalized into [`ApiFailure`] for
//! the chat endpoint or degraded (empty/absent) results for the lookups.

use std::fmt;

use crate::protocol::{ChatRequest, ChatResponse, Folder, FoldersResponse, UserInfo};
use crate::session::Session;

/// Standard User-Agent header for drivechat API requests.
pub const USER_AGENT: &str = concat!("drivechat/", env!("CARGO_PKG_VERSION"));

/// Failure taxonomy for the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// The backend reported the session as unauthenticated (HTTP 401).
    /// Terminal for the session: the caller tears it down.
    SessionExpired,
    /// Any other non-success response; reported inline, session stays valid.
    Api { status: u16, body: String },
    /// Transport-level fault (unreachable backend, undecodable body).
    Network(String),
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::SessionExpired => write!(f, "session expired"),
            ApiFailure::Api { status, body } => {
                let body = body.trim();
                if body.is_empty() {
                    write!(f, "HTTP {status}")
                } else {
                    write!(f, "HTTP {status}: {body}")
                }
            }
            ApiFailure::Network(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiFailure {}

/// Result type for chat-endpoint operations.
pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// Client for the chatbot backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Returns the login entry point the browser should be sent to.
    pub fn login_url(&self) -> String {
        format!("{}/oauth/login", self.base_url)
    }

    /// Sends one chat turn to `POST /api/chat`.
    ///
    /// # Errors
    /// - [`ApiFailure::SessionExpired`] on HTTP 401.
    /// - [`ApiFailure::Api`] on any other non-success status, with the raw body.
    /// - [`ApiFailure::Network`] on transport faults or an undecodable body.
    pub async fn send_chat(&self, token: &str, request: &ChatRequest) -> ApiResult<ChatResponse> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiFailure::Network(format!("request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiFailure::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiFailure::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiFailure::Network(format!("invalid response body: {e}")))
    }

    /// Fetches the folder catalog from `GET /api/folders`.
    ///
    /// Degraded fetch: any failure yields an empty catalog, never an error.
    pub async fn fetch_folders(&self, token: &str) -> Vec<Folder> {
        let result = self
            .http
            .get(format!("{}/api/folders", self.base_url))
            .bearer_auth(token)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "folder listing failed");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "folder listing unreachable");
                return Vec::new();
            }
        };

        match response.json::<FoldersResponse>().await {
            Ok(body) => body.folders,
            Err(e) => {
                tracing::warn!(error = %e, "folder listing returned malformed body");
                Vec::new()
            }
        }
    }

    /// Fetches the authenticated identity from `GET /oauth/me`.
    ///
    /// Degraded fetch: any failure yields `None`. On success the body is
    /// merged with the supplied token to form a [`Session`].
    pub async fn fetch_user(&self, token: &str) -> Option<Session> {
        let response = self
            .http
            .get(format!("{}/oauth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "user info lookup failed");
            return None;
        }

        let info: UserInfo = response.json().await.ok()?;
        Some(Session {
            token: token.to_string(),
            email: info.email,
            name: info.name,
            picture: info.picture,
        })
    }

    /// Notifies the backend of logout via `POST /oauth/logout`.
    ///
    /// Best-effort: the network outcome is ignored; callers always clear
    /// local session state regardless.
    pub async fn logout(&self, token: &str) {
        let result = self
            .http
            .post(format!("{}/oauth/logout", self.base_url))
            .bearer_auth(token)
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!(error = %e, "logout notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::protocol::HistoryEntry;

    fn sample_request() -> ChatRequest {
        ChatRequest {
            message: "List my PDFs".to_string(),
            history: Vec::new(),
            folder_id: None,
        }
    }

    /// Test: a successful chat turn returns the decoded response unchanged.
    #[tokio::test]
    async fn test_send_chat_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("authorization", "Bearer T1"))
            .and(body_partial_json(
                serde_json::json!({"message": "List my PDFs", "history": []}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "Found 3 PDFs",
                "intermediate_steps": [],
                "tokens": 42,
                "error": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let response = client.send_chat("T1", &sample_request()).await.unwrap();
        assert_eq!(response.answer, "Found 3 PDFs");
        assert_eq!(response.tokens, 42);
        assert!(response.error.is_none());
    }

    /// Test: the history window is sent as (role, content) pairs in order.
    #[tokio::test]
    async fn test_send_chat_serializes_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "history": [
                    {"role": "user", "content": "first"},
                    {"role": "assistant", "content": "second"}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest {
            message: "third".to_string(),
            history: vec![
                HistoryEntry {
                    role: "user".to_string(),
                    content: "first".to_string(),
                },
                HistoryEntry {
                    role: "assistant".to_string(),
                    content: "second".to_string(),
                },
            ],
            folder_id: None,
        };
        let client = ApiClient::new(server.uri());
        client.send_chat("T1", &request).await.unwrap();
    }

    /// Test: HTTP 401 maps to SessionExpired.
    #[tokio::test]
    async fn test_send_chat_401_is_session_expired() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Session expired"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client.send_chat("T1", &sample_request()).await.unwrap_err();
        assert_eq!(err, ApiFailure::SessionExpired);
    }

    /// Test: other non-success statuses carry status and raw body.
    #[tokio::test]
    async fn test_send_chat_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client.send_chat("T1", &sample_request()).await.unwrap_err();
        assert_eq!(
            err,
            ApiFailure::Api {
                status: 502,
                body: "bad gateway".to_string()
            }
        );
    }

    /// Test: an unreachable backend is a Network failure, not a panic.
    #[tokio::test]
    async fn test_send_chat_network_fault() {
        let client = ApiClient::new("http://127.0.0.1:1");
        let err = client.send_chat("T1", &sample_request()).await.unwrap_err();
        assert!(matches!(err, ApiFailure::Network(_)));
    }

    /// Test: folder listing degrades to empty on error status and on
    /// transport faults; it never raises.
    #[tokio::test]
    async fn test_fetch_folders_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/folders"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        assert!(client.fetch_folders("T1").await.is_empty());

        let unreachable = ApiClient::new("http://127.0.0.1:1");
        assert!(unreachable.fetch_folders("T1").await.is_empty());
    }

    /// Test: folder listing decodes the catalog on success.
    #[tokio::test]
    async fn test_fetch_folders_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/folders"))
            .and(header("authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folders": [{"id": "1", "name": "Engineering"}]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let folders = client.fetch_folders("T1").await;
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Engineering");
    }

    /// Test: user info merges the supplied token into the Session.
    #[tokio::test]
    async fn test_fetch_user_merges_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "email": "e@x.com",
                "name": "Jo",
                "picture": ""
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let session = client.fetch_user("T1").await.unwrap();
        assert_eq!(session.token, "T1");
        assert_eq!(session.email, "e@x.com");

        let unreachable = ApiClient::new("http://127.0.0.1:1");
        assert!(unreachable.fetch_user("T1").await.is_none());
    }

    /// Test: logout ignores the network outcome entirely.
    #[tokio::test]
    async fn test_logout_is_best_effort() {
        let client = ApiClient::new("http://127.0.0.1:1");
        client.logout("T1").await;
    }
}
