//! Zero-shot item detection via the shared image/text embedding space.
//!
//! The whole image is scored against one natural-language prompt per
//! canonical category; the softmax winner becomes a single full-frame
//! region. This trades localization for zero extra model weights, which
//! suits catalog photos that show one product on a plain background.

use std::sync::Arc;

use anyhow::Result;
use image::DynamicImage;

use stylesearch_core::traits::{Detector, ImageEmbedder, TextEmbedder};
use stylesearch_core::types::{BoundingBox, DetectedRegion};
use stylesearch_core::Category;

use crate::colors::{dominant_colors, style_tags_for};

const PROMPTS: &[(&str, Category)] = &[
    ("a photo of clothing, like a shirt, dress or jacket", Category::Clothing),
    ("a photo of shoes or other footwear", Category::Shoes),
    ("a photo of a bag, handbag or backpack", Category::Bags),
    ("a photo of a fashion accessory, like a watch or belt", Category::Accessories),
];

/// Logit scale applied before softmax, matching CLIP's trained value.
const LOGIT_SCALE: f32 = 100.0;

pub struct ZeroShotDetector {
    image_embedder: Arc<dyn ImageEmbedder>,
    prompt_vectors: Vec<(Category, Vec<f32>)>,
}

impl ZeroShotDetector {
    /// Embed the category prompts once up front; detection afterwards
    /// costs one image embedding.
    pub fn new(
        image_embedder: Arc<dyn ImageEmbedder>,
        text_embedder: &dyn TextEmbedder,
    ) -> Result<Self> {
        let mut prompt_vectors = Vec::with_capacity(PROMPTS.len());
        for (prompt, category) in PROMPTS {
            prompt_vectors.push((*category, text_embedder.embed_text(prompt)?));
        }
        Ok(Self { image_embedder, prompt_vectors })
    }
}

impl Detector for ZeroShotDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectedRegion>> {
        let image_vec = self.image_embedder.embed_image(image)?;
        let logits: Vec<f32> = self
            .prompt_vectors
            .iter()
            .map(|(_, p)| dot(&image_vec, p) * LOGIT_SCALE)
            .collect();
        let probs = softmax(&logits);

        let Some((best, confidence)) = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, p)| (i, *p))
        else {
            return Ok(Vec::new());
        };
        let category = self.prompt_vectors[best].0;

        Ok(vec![DetectedRegion {
            label: category.as_str().to_string(),
            confidence,
            bbox: BoundingBox::full(image.width(), image.height()),
            colors: dominant_colors(image),
            style_tags: style_tags_for(category),
        }])
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum.max(1e-12)).collect()
}
