use crate::config::{self, ClientConfig};
use crate::error::ClientError;
use crate::session::{Session, SharedSession};
use log::{debug, warn};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::RwLockReadGuard;

/// HTTP plumbing shared by every endpoint.
///
/// The session is injected at construction; authenticated requests read the
/// bearer token from it, and a 401 on such a request clears it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
    session: SharedSession,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SharedSession) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(config::USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(config::ACCEPT),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(ApiClient {
            client,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    pub(crate) fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn clear_session(&self) {
        let mut session = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        session.clear();
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request without credentials and decode the JSON body.
    pub(crate) async fn send_public<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        label: &str,
    ) -> Result<T, ClientError> {
        self.execute(builder, label, false).await
    }

    /// Send a request carrying the session token, when there is one.
    pub(crate) async fn send_authenticated<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        label: &str,
    ) -> Result<T, ClientError> {
        self.execute(builder, label, true).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        label: &str,
        authenticated: bool,
    ) -> Result<T, ClientError> {
        let bearer = if authenticated {
            self.read_session().bearer()
        } else {
            None
        };
        let carried_token = bearer.is_some();

        let builder = match bearer {
            Some(value) => builder.header(reqwest::header::AUTHORIZATION, value),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        debug!("[{}] response status: {}", label, status);

        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(ClientError::from);
        }

        let detail = error_detail(status.as_u16(), &body);
        warn!("[{}] request failed: {}", label, detail);

        if status == reqwest::StatusCode::UNAUTHORIZED && carried_token {
            self.clear_session();
            return Err(ClientError::Unauthorized(detail));
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    /// Resolve an audio path returned by the server into a playable URL.
    pub fn full_audio_url(&self, audio_url: &str) -> String {
        resolve_audio_url(&self.config.base_url, audio_url)
    }
}

/// Message shown to the user for a failed response: the body's `detail` when
/// the server sent one, `"Error {status}"` otherwise.
pub fn error_detail(status: u16, body: &str) -> String {
    let fallback = format!("Error {}", status);

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback;
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail.clone(),
        // Validation errors arrive as a list of {"msg": ...} objects
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                fallback
            } else {
                messages.join("; ")
            }
        }
        _ => fallback,
    }
}

pub fn resolve_audio_url(base_url: &str, audio_url: &str) -> String {
    if audio_url.is_empty() {
        return String::new();
    }
    if audio_url.starts_with("http") {
        return audio_url.to_string();
    }
    format!("{}{}", base_url, audio_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;

    #[test]
    fn test_error_detail_from_body() {
        assert_eq!(
            error_detail(404, r#"{"detail":"Story not found"}"#),
            "Story not found"
        );
        assert_eq!(error_detail(500, "<html>oops</html>"), "Error 500");
        assert_eq!(error_detail(400, r#"{"other":1}"#), "Error 400");
        assert_eq!(error_detail(400, r#"{"detail":""}"#), "Error 400");
    }

    #[test]
    fn test_error_detail_validation_list() {
        let body = r#"{"detail":[{"loc":["body","theme"],"msg":"field required"},{"msg":"too young"}]}"#;
        assert_eq!(error_detail(422, body), "field required; too young");
        assert_eq!(error_detail(422, r#"{"detail":[]}"#), "Error 422");
    }

    #[test]
    fn test_resolve_audio_url() {
        let base = "http://127.0.0.1:8000";
        assert_eq!(resolve_audio_url(base, ""), "");
        assert_eq!(
            resolve_audio_url(base, "/data/audio/abc.mp3"),
            "http://127.0.0.1:8000/data/audio/abc.mp3"
        );
        assert_eq!(
            resolve_audio_url(base, "https://cdn.example.com/a.mp3"),
            "https://cdn.example.com/a.mp3"
        );
    }

    #[test]
    fn test_client_keeps_injected_session() {
        let session = Session::with_token("tok").into_shared();
        let client = ApiClient::new(ClientConfig::default(), session.clone()).unwrap();
        assert_eq!(client.read_session().token(), Some("tok"));

        client.clear_session();
        assert!(!session.read().unwrap().is_authenticated());
        assert_eq!(client.url("/users/me"), "http://127.0.0.1:8000/users/me");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is closed on any sane test machine
        let config = ClientConfig::new("http://127.0.0.1:9");
        let session = Session::with_token("tok").into_shared();
        let client = ApiClient::new(config, session.clone()).unwrap();

        let result: Result<serde_json::Value, _> = client
            .send_authenticated(client.request(Method::GET, "/users/me"), "test")
            .await;

        assert!(matches!(result, Err(ClientError::Network(_))));
        // transport failures are not a rejection; the token survives
        assert!(session.read().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_token_clears_session() {
        let (base_url, requests) =
            test_server::serve(401, r#"{"detail":"Could not validate credentials"}"#).await;
        let session = Session::with_token("expired").into_shared();
        let client = ApiClient::new(ClientConfig::new(base_url), session.clone()).unwrap();

        let result: Result<serde_json::Value, _> = client
            .send_authenticated(client.request(Method::GET, "/users/me"), "test")
            .await;

        match result {
            Err(ClientError::Unauthorized(detail)) => {
                assert_eq!(detail, "Could not validate credentials")
            }
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
        assert!(!session.read().unwrap().is_authenticated());

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0]
            .to_lowercase()
            .contains("authorization: bearer expired"));
    }

    #[tokio::test]
    async fn test_401_without_token_is_plain_api_error() {
        let (base_url, requests) = test_server::serve(401, r#"{"detail":"Not authenticated"}"#).await;
        let session = Session::new().into_shared();
        let client = ApiClient::new(ClientConfig::new(base_url), session.clone()).unwrap();

        let result: Result<serde_json::Value, _> = client
            .send_authenticated(client.request(Method::GET, "/api/stories"), "test")
            .await;

        match result {
            Err(ClientError::Api { status, detail }) => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Not authenticated");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert!(!requests.lock().unwrap()[0]
            .to_lowercase()
            .contains("authorization:"));
    }

    #[tokio::test]
    async fn test_other_failures_keep_the_session() {
        let (base_url, _) = test_server::serve(500, "Internal Server Error").await;
        let session = Session::with_token("tok").into_shared();
        let client = ApiClient::new(ClientConfig::new(base_url), session.clone()).unwrap();

        let result: Result<serde_json::Value, _> = client
            .send_authenticated(client.request(Method::GET, "/api/stories"), "test")
            .await;

        match result {
            Err(ClientError::Api { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail, "Error 500");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert!(session.read().unwrap().is_authenticated());
    }
}
