//! Remote form entries fetcher

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::AccessToken;
use crate::config::EntriesConfig;
use crate::dataset::{EntryRow, FieldSchema};

/// Errors from fetching an entity's entries
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Entity request failed: {0}")]
    TransportFailure(String),

    #[error("Could not read entries; invalid formId and/or containerId ({0})")]
    MalformedResponse(String),
}

#[derive(Debug, Deserialize)]
struct EntriesDocument {
    fields: FieldSchema,
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    values: EntryRow,
}

/// Decode an entries body into schema and rows
fn parse_entries(body: &str) -> Result<(FieldSchema, Vec<EntryRow>), FetchError> {
    let doc: EntriesDocument = serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
    let rows = doc.entries.into_iter().map(|e| e.values).collect();
    Ok((doc.fields, rows))
}

/// Fetches schema and entries for one object
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch_entity(
        &self,
        container_id: &str,
        object_id: &str,
        token: &AccessToken,
    ) -> Result<(FieldSchema, Vec<EntryRow>), FetchError>;
}

/// Client for the forms entries API
pub struct FormEntriesClient {
    http: Client,
    base_url: String,
}

impl FormEntriesClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &EntriesConfig, http: Client) -> Self {
        Self::new(http, config.base_url.clone())
    }

    /// Ids become single percent-encoded path segments; `.` and `..` are refused
    fn entries_url(&self, container_id: &str, object_id: &str) -> Result<Url, FetchError> {
        for id in [container_id, object_id] {
            if id == "." || id == ".." {
                return Err(FetchError::MalformedResponse(format!("'{id}' is not a valid id")));
            }
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::TransportFailure(format!("bad entries base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::TransportFailure(format!("entries base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push(container_id)
            .push("forms")
            .push(object_id)
            .push("entries")
            .push("");
        Ok(url)
    }
}

#[async_trait]
impl EntityFetcher for FormEntriesClient {
    async fn fetch_entity(
        &self,
        container_id: &str,
        object_id: &str,
        token: &AccessToken,
    ) -> Result<(FieldSchema, Vec<EntryRow>), FetchError> {
        debug!(%container_id, %object_id, "fetch_entity: called");
        let url = self.entries_url(container_id, object_id)?;
        debug!(%url, "fetch_entity: requesting");

        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "fetch_entity: transport failure");
                FetchError::TransportFailure(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::TransportFailure(e.to_string()))?;

        let (schema, rows) = parse_entries(&body).inspect_err(|e| {
            warn!(%status, error = %e, "fetch_entity: undecodable entries body");
        })?;
        debug!(fields = schema.len(), rows = rows.len(), "fetch_entity: done");
        Ok((schema, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_entries_ignores_extra_keys() {
        let body = json!({
            "fields": [{"fieldId": 1, "name": "x", "type": "number", "required": true}],
            "entries": [{"values": ["1"], "id": 99}, {"values": []}],
            "total": 2
        })
        .to_string();

        let (schema, rows) = parse_entries(&body).unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].field_id, "1");
        assert_eq!(rows, vec![vec![json!("1")], vec![]]);
    }

    #[test]
    fn test_parse_entries_rejects_wrong_shape() {
        assert!(matches!(parse_entries("{}"), Err(FetchError::MalformedResponse(_))));
        assert!(matches!(
            parse_entries(r#"{"fields": [], "entries": [{"vals": []}]}"#),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(parse_entries("<html/>"), Err(FetchError::MalformedResponse(_))));
    }

    #[test]
    fn test_entries_url() {
        let client = FormEntriesClient::new(Client::new(), "https://api.test/v1/");
        let url = client.entries_url("C1", "form-7").unwrap();
        assert_eq!(url.as_str(), "https://api.test/v1/C1/forms/form-7/entries/");

        let root = FormEntriesClient::new(Client::new(), "http://127.0.0.1:8080");
        let url = root.entries_url("C1", "form-7").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/C1/forms/form-7/entries/");
    }

    #[test]
    fn test_entries_url_encodes_reserved_characters() {
        let client = FormEntriesClient::new(Client::new(), "https://api.test/v1");
        let url = client.entries_url("a/b", "../../admin?x=1#frag").unwrap();

        assert_eq!(url.host_str(), Some("api.test"));
        assert!(url.path().starts_with("/v1/a%2Fb/forms/"), "{url}");
        assert!(url.path().ends_with("/entries/"), "{url}");
        assert_eq!(url.path_segments().unwrap().count(), 6);
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[tokio::test]
    async fn test_dot_segment_ids_are_rejected() {
        let client = FormEntriesClient::new(Client::new(), "http://127.0.0.1:9");
        for (container_id, object_id) in [("..", "form-7"), ("C1", "."), ("C1", "..")] {
            let err = client
                .fetch_entity(container_id, object_id, &AccessToken::new("tok"))
                .await
                .unwrap_err();
            assert!(matches!(err, FetchError::MalformedResponse(_)), "{container_id}/{object_id}");
        }
    }

    #[tokio::test]
    async fn test_fetch_entity_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/C1/forms/form-7/entries/"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fields": [
                    {"fieldId": "1", "name": "x", "type": "number"},
                    {"fieldId": "2", "name": "y", "type": "number"}
                ],
                "entries": [{"values": ["1", "3"]}, {"values": ["2", "6"]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = FormEntriesClient::new(Client::new(), server.uri());
        let (schema, rows) = client
            .fetch_entity("C1", "form-7", &AccessToken::new("tok-123"))
            .await
            .unwrap();
        assert_eq!(schema[1].name, "y");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![json!("2"), json!("6")]);
    }

    #[tokio::test]
    async fn test_fetch_entity_not_found_page_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let client = FormEntriesClient::new(Client::new(), server.uri());
        let err = client
            .fetch_entity("bad", "form-7", &AccessToken::new("tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
        assert!(err.to_string().contains("invalid formId and/or containerId"));
    }

    #[tokio::test]
    async fn test_fetch_entity_transport_failure() {
        let client = FormEntriesClient::new(Client::new(), "http://127.0.0.1:9");
        let err = client
            .fetch_entity("C1", "form-7", &AccessToken::new("tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TransportFailure(_)));
    }
}
