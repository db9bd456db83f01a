//! Deterministic hashing embedder for tests and model-less environments.
//!
//! Not semantically meaningful, but stable: the same text or image always
//! maps to the same unit vector, and distinct inputs rarely collide.

use std::hash::{Hash, Hasher};

use anyhow::Result;
use image::DynamicImage;
use twox_hash::XxHash64;

use stylesearch_core::traits::{ImageEmbedder, TextEmbedder};

use crate::clip::normalize;

const THUMB_SIZE: u32 = 8;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn bucket(&self, h: u64) -> (usize, f32) {
        let idx = (h as usize) % self.dim;
        let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        (idx, val)
    }
}

impl TextEmbedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let (idx, val) = self.bucket(hasher.finish());
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        Ok(normalize(v))
    }
}

impl ImageEmbedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        // An 8x8 luma thumbnail makes the vector a function of coarse
        // image content rather than raw bytes, so near-identical crops
        // of one image land near each other.
        let thumb = image.thumbnail_exact(THUMB_SIZE, THUMB_SIZE).to_luma8();
        let mut v = vec![0f32; self.dim];
        for (i, pixel) in thumb.pixels().enumerate() {
            let mut hasher = XxHash64::with_seed(i as u64);
            pixel.0[0].hash(&mut hasher);
            let (idx, val) = self.bucket(hasher.finish());
            v[idx] += val;
        }
        Ok(normalize(v))
    }
}
