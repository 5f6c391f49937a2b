//! Lazily loaded, explicitly owned classifier handle.

use crate::error::{Error, Result};
use crate::inference::{Classifier, ClassifierGateway};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Single-initialization handle around a [`ClassifierGateway`].
///
/// The first [`acquire`](Self::acquire) loads the classifier on the blocking
/// pool; concurrent callers wait for that load instead of starting another.
/// A successful load is kept for the lifetime of the handle. A failed load is
/// not cached, so the next acquisition retries from scratch.
pub struct ModelHandle {
    gateway: Arc<dyn ClassifierGateway>,
    classifier: OnceCell<Arc<dyn Classifier>>,
}

impl ModelHandle {
    /// Wrap a gateway. Nothing is loaded until the first acquisition.
    pub fn new(gateway: Arc<dyn ClassifierGateway>) -> Self {
        Self {
            gateway,
            classifier: OnceCell::new(),
        }
    }

    /// Whether a classifier has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.classifier.initialized()
    }

    /// Get the classifier, loading it on first use.
    pub async fn acquire(&self) -> Result<Arc<dyn Classifier>> {
        if let Some(classifier) = self.classifier.get() {
            debug!("Classifier already loaded");
            return Ok(Arc::clone(classifier));
        }

        let classifier = self
            .classifier
            .get_or_try_init(|| async {
                info!("Loading classifier...");
                let gateway = Arc::clone(&self.gateway);
                let loaded = tokio::task::spawn_blocking(move || gateway.load())
                    .await
                    .map_err(|e| Error::ModelLoad {
                        reason: format!("loader task failed: {e}"),
                    })?;
                match &loaded {
                    Ok(_) => info!("Classifier loaded"),
                    Err(e) => warn!("Classifier load failed: {e}"),
                }
                loaded
            })
            .await?;

        Ok(Arc::clone(classifier))
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
