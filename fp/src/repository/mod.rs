//! Template repository clients
//!
//! A repository answers one batched lookup per pipeline run: the plot template
//! and the visual template for an object, each zero-or-one. Missing records are
//! `None`; only a store that cannot answer is an error.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

mod local;
mod remote;

pub use local::LocalTemplateRepository;
pub use remote::RemoteTemplateRepository;
pub use templatestore::{BatchGet, PlotTemplate, TemplatePair, VisualTemplate};

use crate::config::{RepositoryBackend, RepositoryConfig};
use crate::credentials::StoreCredentials;

/// Errors from template lookups
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Template store unavailable: {0}")]
    Unavailable(String),

    #[error("Template store returned an unreadable response: {0}")]
    Malformed(String),
}

impl From<templatestore::StoreError> for RepositoryError {
    fn from(err: templatestore::StoreError) -> Self {
        RepositoryError::Unavailable(err.to_string())
    }
}

/// An identifier in a request was empty
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} must not be empty")]
pub struct EmptyIdentifier(pub &'static str);

/// Identifiers naming an object and its two templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequest {
    pub object_id: String,
    pub plot_template_id: String,
    pub visual_template_id: String,
}

impl TemplateRequest {
    pub fn new(
        object_id: impl Into<String>,
        plot_template_id: impl Into<String>,
        visual_template_id: impl Into<String>,
    ) -> Result<Self, EmptyIdentifier> {
        let request = Self {
            object_id: object_id.into(),
            plot_template_id: plot_template_id.into(),
            visual_template_id: visual_template_id.into(),
        };
        if request.object_id.trim().is_empty() {
            return Err(EmptyIdentifier("objectId"));
        }
        if request.plot_template_id.trim().is_empty() {
            return Err(EmptyIdentifier("plotTemplateId"));
        }
        if request.visual_template_id.trim().is_empty() {
            return Err(EmptyIdentifier("visualTemplateId"));
        }
        Ok(request)
    }

    /// The batched read for this request: plot table strong, visual table default
    pub fn batch_get(&self) -> BatchGet {
        BatchGet::for_object(&self.object_id, &self.plot_template_id, &self.visual_template_id)
    }
}

/// Batched two-table template lookup
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Fetch the plot and visual template named by the request
    async fn fetch(&self, request: &TemplateRequest) -> Result<TemplatePair, RepositoryError>;
}

/// Create the repository selected in config
///
/// The remote backend needs the store credentials loaded at startup.
pub fn create_repository(
    config: &RepositoryConfig,
    http: reqwest::Client,
    credentials: Option<Arc<StoreCredentials>>,
) -> eyre::Result<Arc<dyn TemplateRepository>> {
    debug!(backend = ?config.backend, "create_repository: called");
    match config.backend {
        RepositoryBackend::Local => {
            let path = config.sqlite_path();
            Ok(Arc::new(LocalTemplateRepository::open(&path)?))
        }
        RepositoryBackend::Remote => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| eyre::eyre!("repository.endpoint is required for the remote backend"))?;
            let credentials =
                credentials.ok_or_else(|| eyre::eyre!("store credentials are required for the remote backend"))?;
            Ok(Arc::new(RemoteTemplateRepository::new(
                http,
                endpoint,
                credentials,
                config.plot_table.clone(),
                config.visual_table.clone(),
            )))
        }
    }
}
