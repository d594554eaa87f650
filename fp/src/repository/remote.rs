//! Repository backed by an HTTP document-store gateway
//!
//! The gateway speaks a BatchGetItem-shaped JSON protocol: one POST names the
//! keys to read from each table and whether the read must be consistent, and
//! the answer lists the matching items per table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{BatchGet, RepositoryError, TemplatePair, TemplateRepository, TemplateRequest};
use crate::credentials::StoreCredentials;

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(rename = "Responses", default)]
    responses: HashMap<String, Vec<serde_json::Value>>,
    #[serde(rename = "UnprocessedKeys", default)]
    unprocessed: HashMap<String, serde_json::Value>,
}

impl BatchGetResponse {
    /// True when the gateway left keys for `table` unread
    fn left_unread(&self, table: &str) -> bool {
        match self.unprocessed.get(table) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Object(map)) => !map.is_empty(),
            Some(serde_json::Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }
}

/// Document-store gateway client
pub struct RemoteTemplateRepository {
    http: Client,
    endpoint: String,
    credentials: Arc<StoreCredentials>,
    plot_table: String,
    visual_table: String,
}

impl RemoteTemplateRepository {
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        credentials: Arc<StoreCredentials>,
        plot_table: impl Into<String>,
        visual_table: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credentials,
            plot_table: plot_table.into(),
            visual_table: visual_table.into(),
        }
    }

    /// Build the BatchGetItem request body
    fn build_request_body(&self, get: &BatchGet) -> serde_json::Value {
        let mut items = serde_json::Map::new();
        items.insert(
            self.plot_table.clone(),
            serde_json::json!({
                "Keys": [&get.plot],
                "ConsistentRead": get.plot_read.is_strong(),
            }),
        );
        items.insert(
            self.visual_table.clone(),
            serde_json::json!({
                "Keys": [&get.visual],
                "ConsistentRead": get.visual_read.is_strong(),
            }),
        );
        serde_json::json!({ "RequestItems": items })
    }

    /// Take the first item returned for a table
    fn first_item<T: DeserializeOwned>(
        &self,
        response: &mut BatchGetResponse,
        table: &str,
    ) -> Result<Option<T>, RepositoryError> {
        let Some(item) = response.responses.remove(table).and_then(|items| items.into_iter().next()) else {
            return Ok(None);
        };
        serde_json::from_value(item)
            .map(Some)
            .map_err(|e| RepositoryError::Malformed(format!("{table}: {e}")))
    }
}

#[async_trait]
impl TemplateRepository for RemoteTemplateRepository {
    async fn fetch(&self, request: &TemplateRequest) -> Result<TemplatePair, RepositoryError> {
        debug!(?request, endpoint = %self.endpoint, "RemoteTemplateRepository::fetch: called");
        let url = format!("{}/batch-get-item", self.endpoint);
        let body = self.build_request_body(&request.batch_get());

        let response = self
            .http
            .post(url)
            .basic_auth(&self.credentials.key, Some(self.credentials.secret()))
            .header("x-store-region", &self.credentials.region)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "RemoteTemplateRepository::fetch: transport failure");
                RepositoryError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "RemoteTemplateRepository::fetch: store rejected request");
            return Err(RepositoryError::Unavailable(format!("store returned {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        let mut parsed: BatchGetResponse =
            serde_json::from_str(&text).map_err(|e| RepositoryError::Malformed(e.to_string()))?;

        for table in [&self.plot_table, &self.visual_table] {
            if parsed.left_unread(table) {
                warn!(%table, "RemoteTemplateRepository::fetch: keys left unprocessed");
                return Err(RepositoryError::Unavailable(format!("store left {table} keys unprocessed")));
            }
        }

        let plot = self.first_item(&mut parsed, &self.plot_table)?;
        let visual = self.first_item(&mut parsed, &self.visual_table)?;
        debug!(plot_found = plot.is_some(), visual_found = visual.is_some(), "RemoteTemplateRepository::fetch: done");
        Ok(TemplatePair { plot, visual })
    }
}
