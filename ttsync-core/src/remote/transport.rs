//! Authentication and HTTP transport for the calendar service.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::TtConfig;
use crate::constants::{
    AGENT_HEADER, DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, SESSION_COOKIE,
};
use crate::error::{TtError, TtResult};

/// Username and password used to obtain a session.
#[derive(Clone)]
pub struct Login {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque session token issued at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Supplies credentials on demand, for the first login and every re-login.
pub trait CredentialsProvider {
    fn credentials(&self) -> TtResult<Login>;
}

impl CredentialsProvider for Login {
    fn credentials(&self) -> TtResult<Login> {
        Ok(self.clone())
    }
}

/// The two calls the sync client needs from the service.
pub trait Transport {
    /// Exchange credentials for a session. A rejected sign-in is
    /// `TtError::Auth`; an unreachable service is `TtError::Transport`.
    fn login(&self, login: &Login) -> impl Future<Output = TtResult<SessionId>> + Send;

    /// Authenticated GET of `path`, relative to the API root.
    /// Failures are `TtError::Transport`.
    fn get_json(
        &self,
        session: &SessionId,
        path: &str,
    ) -> impl Future<Output = TtResult<serde_json::Value>> + Send;
}

#[derive(Serialize)]
struct SignIn<'a> {
    uid: &'a str,
    password: &'a str,
    uuid: String,
}

/// `Transport` over HTTPS using reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
    agent: String,
    auth_timeout: Duration,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(api_url: impl Into<String>, agent: impl Into<String>) -> Self {
        HttpTransport {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            agent: agent.into(),
            auth_timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &TtConfig) -> Self {
        HttpTransport {
            auth_timeout: Duration::from_secs(config.auth_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            ..Self::new(&config.api_url, &config.agent)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    async fn login(&self, login: &Login) -> TtResult<SessionId> {
        let body = SignIn {
            uid: &login.username,
            password: &login.password,
            uuid: uuid::Uuid::new_v4().simple().to_string(),
        };

        let response = self
            .client
            .put(self.url("/auth/email/signin"))
            .header(AGENT_HEADER, &self.agent)
            .json(&body)
            .timeout(self.auth_timeout)
            .send()
            .await
            .map_err(|e| TtError::Transport(format!("sign-in request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TtError::Auth(format!(
                "sign-in rejected with status {}",
                response.status()
            )));
        }

        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_from_set_cookie)
            .map(SessionId)
            .ok_or_else(|| {
                TtError::Auth(format!("sign-in response has no {} cookie", SESSION_COOKIE))
            })
    }

    async fn get_json(&self, session: &SessionId, path: &str) -> TtResult<serde_json::Value> {
        let response = self
            .client
            .get(self.url(path))
            .header(COOKIE, format!("{}={}", SESSION_COOKIE, session.0))
            .header(AGENT_HEADER, &self.agent)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| TtError::Transport(format!("GET {} failed: {}", path, e)))?;

        if response.status() != StatusCode::OK {
            return Err(TtError::Transport(format!(
                "GET {} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TtError::Transport(format!("GET {} returned invalid JSON: {}", path, e)))
    }
}

/// Value of the session cookie in one `Set-Cookie` header, if it is that cookie.
fn session_from_set_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    (name.trim() == SESSION_COOKIE && !value.trim().is_empty()).then(|| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn login() -> Login {
        Login {
            username: "ruth@example.com".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn session_cookie_extraction() {
        assert_eq!(
            session_from_set_cookie("_session_id=abc123; path=/; HttpOnly"),
            Some("abc123".into())
        );
        assert_eq!(session_from_set_cookie("other=1; path=/"), None);
        assert_eq!(session_from_set_cookie("_session_id=; path=/"), None);
    }

    #[test]
    fn login_debug_hides_password() {
        assert!(!format!("{:?}", login()).contains("hunter2"));
    }

    #[tokio::test]
    async fn login_puts_credentials_and_reads_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/auth/email/signin"))
            .and(header(AGENT_HEADER, "web/test"))
            .and(body_partial_json(serde_json::json!({
                "uid": "ruth@example.com",
                "password": "hunter2",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "_session_id=s-42; path=/; HttpOnly"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "web/test");
        let session = transport.login(&login()).await.unwrap();
        assert_eq!(session, SessionId("s-42".into()));
    }

    #[tokio::test]
    async fn rejected_login_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "web/test");
        let err = transport.login(&login()).await.unwrap_err();
        assert!(matches!(err, TtError::Auth(_)));
    }

    #[tokio::test]
    async fn login_without_cookie_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "web/test");
        let err = transport.login(&login()).await.unwrap_err();
        assert!(matches!(err, TtError::Auth(_)));
    }

    #[tokio::test]
    async fn unreachable_sign_in_is_a_transport_error() {
        // A port that was just free has nothing listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(format!("http://{}", addr), "web/test");
        let err = transport.login(&login()).await.unwrap_err();
        assert!(matches!(err, TtError::Transport(_)));
    }

    #[tokio::test]
    async fn get_attaches_session_and_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars"))
            .and(query_param("since", "0"))
            .and(header("cookie", "_session_id=s-42"))
            .and(header(AGENT_HEADER, "web/test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"calendars": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(format!("{}/", server.uri()), "web/test");
        let body = transport
            .get_json(&SessionId("s-42".into()), "/calendars?since=0")
            .await
            .unwrap();
        assert_eq!(body, serde_json::json!({"calendars": []}));
    }

    #[tokio::test]
    async fn non_ok_status_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri(), "web/test");
        let err = transport
            .get_json(&SessionId("s".into()), "/calendars")
            .await
            .unwrap_err();
        assert!(matches!(err, TtError::Transport(_)));
    }
}
