use async_trait::async_trait;
use image::DynamicImage;

use crate::category::Category;
use crate::types::{DetectedRegion, Product, ScoredProduct};

/// Produces a fixed-width embedding for an image. Implementations must
/// return unit-normalized vectors of exactly `dim()` components.
pub trait ImageEmbedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_image(&self, image: &DynamicImage) -> anyhow::Result<Vec<f32>>;
}

/// Produces a fixed-width embedding for a text string, in the same space
/// as the paired [`ImageEmbedder`].
pub trait TextEmbedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Locates fashion items within an image. An empty result is a valid
/// outcome, not an error.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<DetectedRegion>>;
}

/// Persistent store of products keyed by id, each carrying one embedding
/// vector of the store's fixed width.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn dim(&self) -> usize;

    /// Insert or fully replace the record for `id`.
    async fn upsert(&self, id: &str, vector: &[f32], product: &Product) -> anyhow::Result<()>;

    async fn delete(&self, id: &str) -> anyhow::Result<()>;

    async fn exists(&self, id: &str) -> anyhow::Result<bool>;

    /// Nearest neighbors by cosine similarity, best first, optionally
    /// restricted to one category.
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        category: Option<Category>,
    ) -> anyhow::Result<Vec<ScoredProduct>>;

    /// Every stored product payload, without vectors. Order unspecified.
    async fn scan_payloads(&self) -> anyhow::Result<Vec<Product>>;

    async fn count(&self) -> anyhow::Result<usize>;
}

/// Check a vector against the width the store was opened with.
pub fn check_dim(expected: usize, vector: &[f32]) -> anyhow::Result<()> {
    if vector.len() != expected {
        anyhow::bail!(
            "vector width {} does not match store width {}",
            vector.len(),
            expected
        );
    }
    Ok(())
}
