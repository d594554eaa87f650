//! Repository backed by the local SQLite template store

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use templatestore::TemplateStore;
use tracing::debug;

use super::{RepositoryError, TemplatePair, TemplateRepository, TemplateRequest};

/// Serves lookups from a `TemplateStore` on the blocking thread pool
#[derive(Clone)]
pub struct LocalTemplateRepository {
    store: Arc<Mutex<TemplateStore>>,
}

impl LocalTemplateRepository {
    /// Open the SQLite database at `path`
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        debug!(path = %path.display(), "LocalTemplateRepository::open: called");
        Ok(Self::from_store(TemplateStore::open(path)?))
    }

    pub fn from_store(store: TemplateStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

#[async_trait]
impl TemplateRepository for LocalTemplateRepository {
    async fn fetch(&self, request: &TemplateRequest) -> Result<TemplatePair, RepositoryError> {
        debug!(?request, "LocalTemplateRepository::fetch: called");
        let store = Arc::clone(&self.store);
        let get = request.batch_get();

        tokio::task::spawn_blocking(move || -> Result<TemplatePair, RepositoryError> {
            let mut store = store
                .lock()
                .map_err(|_| RepositoryError::Unavailable("template store lock poisoned".to_string()))?;
            Ok(store.batch_get(&get)?)
        })
        .await
        .map_err(|e| RepositoryError::Unavailable(format!("template store task failed: {e}")))?
    }
}
