#![deny(warnings)]
#![deny(unused_imports)]

pub mod colors;
pub mod scripted;
pub mod zero_shot;

use std::sync::Arc;

use anyhow::Result;

use stylesearch_core::traits::{Detector, ImageEmbedder, TextEmbedder};

pub use scripted::{FailingDetector, ScriptedDetector};
pub use zero_shot::ZeroShotDetector;

/// Build the default detector on top of an existing embedder pair.
/// Reusing the embedders means detection works with whatever the pair
/// is, full CLIP or the hashing fallback.
pub fn default_detector(
    image_embedder: Arc<dyn ImageEmbedder>,
    text_embedder: &dyn TextEmbedder,
) -> Result<Arc<dyn Detector>> {
    Ok(Arc::new(ZeroShotDetector::new(image_embedder, text_embedder)?))
}
