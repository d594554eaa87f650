//! Request pipeline: templates, validation, token, entries, dataset
//!
//! Each stage runs once, in order, and the first failure ends the run. The
//! failure keeps its stage error and maps onto an HTTP-facing [`StatusClass`].

use std::sync::Arc;

use eyre::Context;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, OAuthClient, TokenExchange};
use crate::config::{Config, RepositoryBackend};
use crate::credentials::StoreCredentials;
use crate::dataset::{AssemblyError, Dataset, assemble};
use crate::entity::{EntityFetcher, FetchError, FormEntriesClient};
use crate::repository::{EmptyIdentifier, RepositoryError, TemplateRepository, TemplateRequest, create_repository};
use crate::validate::{ValidationError, validate};

/// Coarse outcome class of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Unauthorized,
    NotFound,
    Unprocessable,
    ServiceUnavailable,
}

impl StatusClass {
    pub fn code(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::Unauthorized => 401,
            StatusClass::NotFound => 404,
            StatusClass::Unprocessable => 422,
            StatusClass::ServiceUnavailable => 503,
        }
    }
}

/// A failed pipeline run, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl From<EmptyIdentifier> for PipelineError {
    fn from(err: EmptyIdentifier) -> Self {
        PipelineError::InvalidRequest(err.to_string())
    }
}

impl PipelineError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            PipelineError::InvalidRequest(_) => StatusClass::BadRequest,
            PipelineError::Validation(ValidationError::BothMissing) => StatusClass::NotFound,
            PipelineError::Validation(_) => StatusClass::BadRequest,
            PipelineError::Fetch(FetchError::MalformedResponse(_)) => StatusClass::BadRequest,
            PipelineError::Auth(AuthError::InvalidCredentials { .. }) => StatusClass::Unauthorized,
            PipelineError::Assembly(_) => StatusClass::Unprocessable,
            PipelineError::Repository(_)
            | PipelineError::Auth(AuthError::TransportFailure(_))
            | PipelineError::Fetch(FetchError::TransportFailure(_)) => StatusClass::ServiceUnavailable,
        }
    }
}

/// Identifiers plus the caller's client credentials
#[derive(Clone)]
pub struct PipelineRequest {
    pub template: TemplateRequest,
    pub client_id: String,
    pub client_secret: String,
}

impl PipelineRequest {
    pub fn new(template: TemplateRequest, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            template,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for PipelineRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRequest")
            .field("template", &self.template)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Stage collaborators for one process; runs share nothing mutable
#[derive(Clone)]
pub struct Pipeline {
    repository: Arc<dyn TemplateRepository>,
    tokens: Arc<dyn TokenExchange>,
    entities: Arc<dyn EntityFetcher>,
}

impl Pipeline {
    pub fn new(
        repository: Arc<dyn TemplateRepository>,
        tokens: Arc<dyn TokenExchange>,
        entities: Arc<dyn EntityFetcher>,
    ) -> Self {
        Self {
            repository,
            tokens,
            entities,
        }
    }

    /// Wire the production clients described by `config`
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        debug!(backend = ?config.repository.backend, "Pipeline::from_config: called");
        let http = config.http.build_client().context("Failed to build HTTP client")?;

        let credentials = match (&config.repository.backend, config.repository.credentials_file()) {
            (RepositoryBackend::Remote, Some(path)) => Some(Arc::new(StoreCredentials::load(path)?)),
            _ => None,
        };

        let repository = create_repository(&config.repository, http.clone(), credentials)?;
        let tokens = Arc::new(OAuthClient::from_config(&config.auth, http.clone()));
        let entities = Arc::new(FormEntriesClient::from_config(&config.entries, http));
        info!(backend = ?config.repository.backend, "Pipeline ready");
        Ok(Self::new(repository, tokens, entities))
    }

    /// Run every stage for one request
    pub async fn run(&self, request: &PipelineRequest) -> Result<Dataset, PipelineError> {
        debug!(?request, "run: called");
        let result = self.run_stages(request).await;
        match &result {
            Ok(dataset) => debug!(rows = dataset.len(), "run: done"),
            Err(e) => warn!(error = %e, status = e.status_class().code(), "run: failed"),
        }
        result
    }

    async fn run_stages(&self, request: &PipelineRequest) -> Result<Dataset, PipelineError> {
        if request.client_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("client_id is required".to_string()));
        }
        if request.client_secret.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("client_secret is required".to_string()));
        }

        let pair = self.repository.fetch(&request.template).await?;
        debug!(plot = pair.plot.is_some(), visual = pair.visual.is_some(), "run_stages: templates fetched");

        let (plot, _visual) = validate(pair.plot, pair.visual)?;

        let token = self.tokens.exchange(&request.client_id, &request.client_secret).await?;
        debug!("run_stages: token acquired");

        let (schema, rows) = self
            .entities
            .fetch_entity(&plot.container_id, &request.template.object_id, &token)
            .await?;

        Ok(assemble(schema, rows)?)
    }
}
