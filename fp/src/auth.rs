//! OAuth client-credentials exchange
//!
//! Every pipeline run exchanges the caller's client id and secret for a fresh
//! bearer token. Tokens are never cached and a failed exchange is not retried.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AuthConfig;

/// Errors from the credential exchange
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token request failed: {0}")]
    TransportFailure(String),

    #[error("Could not get access token; invalid credentials specified (status {status})")]
    InvalidCredentials { status: u16 },
}

/// Opaque bearer token scoped to the requesting client
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Pull `access_token` out of a token endpoint body
///
/// Non-JSON bodies and bodies without a non-empty token yield `None`.
fn parse_token(body: &str) -> Option<AccessToken> {
    serde_json::from_str::<TokenResponse>(body)
        .ok()?
        .access_token
        .filter(|t| !t.is_empty())
        .map(AccessToken)
}

/// Exchanges client credentials for an access token
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, client_id: &str, client_secret: &str) -> Result<AccessToken, AuthError>;
}

/// Client for a fixed OAuth token endpoint
pub struct OAuthClient {
    http: Client,
    token_url: String,
}

impl OAuthClient {
    pub fn new(http: Client, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    pub fn from_config(config: &AuthConfig, http: Client) -> Self {
        debug!(token_url = %config.token_url, "OAuthClient::from_config: called");
        Self::new(http, config.token_url.clone())
    }
}

#[async_trait]
impl TokenExchange for OAuthClient {
    async fn exchange(&self, client_id: &str, client_secret: &str) -> Result<AccessToken, AuthError> {
        debug!(%client_id, token_url = %self.token_url, "exchange: called");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "exchange: transport failure");
                AuthError::TransportFailure(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::TransportFailure(e.to_string()))?;

        match parse_token(&body) {
            Some(token) => {
                debug!(status, "exchange: token issued");
                Ok(token)
            }
            None => {
                warn!(status, %client_id, "exchange: no access token in response");
                Err(AuthError::InvalidCredentials { status })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OAuthClient {
        OAuthClient::new(Client::new(), format!("{}/oauth/token", server.uri()))
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token(r#"{"access_token": "abc"}"#), Some(AccessToken::new("abc")));
        assert_eq!(parse_token(r#"{"access_token": ""}"#), None);
        assert_eq!(parse_token("{}"), None);
        assert_eq!(parse_token("not json"), None);
        assert_eq!(parse_token(r#"{"access_token": 42}"#), None);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        assert!(!format!("{:?}", token).contains("super-secret"));
        assert_eq!(token.secret(), "super-secret");
    }

    #[tokio::test]
    async fn test_exchange_sends_client_credentials_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=my-client"))
            .and(body_string_contains("client_secret=my-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-123",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client(&server).exchange("my-client", "my-secret").await.unwrap();
        assert_eq!(token.secret(), "tok-123");
    }

    #[tokio::test]
    async fn test_exchange_empty_object_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = client(&server).exchange("id", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials { status: 200 }));
    }

    #[tokio::test]
    async fn test_exchange_error_status_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("<html>denied</html>"))
            .mount(&server)
            .await;

        let err = client(&server).exchange("id", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials { status: 401 }));
    }

    #[tokio::test]
    async fn test_exchange_transport_failure() {
        let client = OAuthClient::new(Client::new(), "http://127.0.0.1:9/oauth/token");
        let err = client.exchange("id", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::TransportFailure(_)));
    }
}
