#![deny(warnings)]
#![deny(unused_imports)]

pub mod clip;
pub mod device;
pub mod hash;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use stylesearch_core::traits::{ImageEmbedder, TextEmbedder};
use stylesearch_core::AppConfig;

pub use clip::{ClipEmbedder, CLIP_DIM};
pub use hash::HashEmbedder;

/// Image and text embedders sharing one vector space.
pub type EmbedderPair = (Arc<dyn ImageEmbedder>, Arc<dyn TextEmbedder>);

fn use_fake() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured embedder pair.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` selects the hashing embedder outright.
/// Otherwise CLIP is loaded from `model_dir`; a load failure falls back
/// to the hashing embedder in degraded mode rather than aborting, so
/// ingestion and search stay available without model files.
pub fn default_embedders(config: &AppConfig) -> Result<EmbedderPair> {
    if use_fake() {
        info!("using hashing embedders (APP_USE_FAKE_EMBEDDINGS)");
        let hash = Arc::new(HashEmbedder::new(config.embedding_dim));
        return Ok((hash.clone(), hash));
    }
    if config.embedding_dim != CLIP_DIM {
        anyhow::bail!(
            "embedding_dim {} is incompatible with CLIP ViT-B/32 ({})",
            config.embedding_dim,
            CLIP_DIM
        );
    }
    match ClipEmbedder::load(&config.model_dir()) {
        Ok(clip) => {
            let clip = Arc::new(clip);
            Ok((clip.clone(), clip))
        }
        Err(e) => {
            warn!(error = %e, "CLIP load failed, falling back to hashing embedders");
            let hash = Arc::new(HashEmbedder::new(config.embedding_dim));
            Ok((hash.clone(), hash))
        }
    }
}
