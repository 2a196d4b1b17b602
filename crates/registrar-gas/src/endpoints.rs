//! Ranked endpoints with sequential fallback.

use {
    crate::backend::Backend,
    anyhow::{Result, anyhow},
    std::{future::Future, sync::Arc},
};

/// Backends of one chain in the order they should be tried.
#[derive(Clone, Default)]
pub struct Endpoints(Vec<Arc<dyn Backend>>);

impl Endpoints {
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Self {
        Self(backends)
    }

    pub fn push(&mut self, backend: Arc<dyn Backend>) {
        self.0.push(backend);
    }

    pub fn first(&self) -> Option<&Arc<dyn Backend>> {
        self.0.first()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|backend| backend.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Runs `operation` against one backend after the other until it
    /// succeeds. Every backend is tried at most once and only the last error
    /// is returned.
    pub async fn first_success<'a, T, F, Fut>(&'a self, mut operation: F) -> Result<T>
    where
        F: FnMut(&'a Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;
        for backend in &self.0 {
            match operation(backend).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    tracing::warn!(backend = %backend.name(), ?err, "endpoint failed");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no endpoints configured")))
    }
}

impl std::fmt::Debug for Endpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
