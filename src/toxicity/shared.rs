// Process-wide classifier handle, built lazily on first use.
//
// Loading a model is slow, so it happens at most once. Concurrent first
// callers all await the same in-flight construction. If construction fails
// the cell stays empty and the next caller tries again.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use super::traits::ToxicityClassifier;

/// Something that can build a classifier. Called at most once per successful
/// construction.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ToxicityClassifier>>;
}

pub struct SharedClassifier {
    loader: Box<dyn ClassifierLoader>,
    cell: OnceCell<Arc<dyn ToxicityClassifier>>,
}

impl SharedClassifier {
    pub fn new(loader: impl ClassifierLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    /// Get the classifier, constructing it if this is the first use.
    pub async fn get(&self) -> Result<Arc<dyn ToxicityClassifier>> {
        let classifier = self
            .cell
            .get_or_try_init(|| async {
                info!("Loading toxicity classifier");
                let classifier = self.loader.load().await?;
                info!("Toxicity classifier ready");
                Ok::<_, anyhow::Error>(classifier)
            })
            .await?;
        Ok(Arc::clone(classifier))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
