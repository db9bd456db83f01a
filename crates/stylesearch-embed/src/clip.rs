//! CLIP ViT-B/32 embedder: images and text project into one 512-wide
//! space, so an image vector can be queried with a text vector and
//! vice versa.

use std::path::Path;

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use image::DynamicImage;
use tokenizers::Tokenizer;
use tracing::info;

use stylesearch_core::traits::{ImageEmbedder, TextEmbedder};

use crate::device::select_device;

pub const CLIP_DIM: usize = 512;

pub struct ClipEmbedder {
    model: ClipModel,
    tokenizer: Tokenizer,
    config: ClipConfig,
    device: Device,
    pad_id: u32,
}

impl ClipEmbedder {
    /// Load weights (`model.safetensors`) and `tokenizer.json` from
    /// `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        let config = ClipConfig::vit_base_patch32();

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)
        })?;
        let pad_id = *tokenizer
            .get_vocab(true)
            .get("<|endoftext|>")
            .ok_or_else(|| anyhow!("Tokenizer has no <|endoftext|> token"))?;

        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)?
        };
        let model = ClipModel::new(vb, &config)?;
        info!(dir = %model_dir.display(), "loaded CLIP ViT-B/32");
        Ok(Self { model, tokenizer, config, device, pad_id })
    }

    fn preprocess(&self, image: &DynamicImage) -> Result<Tensor> {
        let size = self.config.image_size;
        let img = image
            .resize_to_fill(size as u32, size as u32, image::imageops::FilterType::Triangle)
            .to_rgb8()
            .into_raw();
        let pixels = Tensor::from_vec(img, (size, size, 3), &self.device)?
            .permute((2, 0, 1))?
            .to_dtype(DType::F32)?
            .affine(2. / 255., -1.)?
            .unsqueeze(0)?;
        Ok(pixels)
    }

    fn tokenize(&self, text: &str) -> Result<Tensor> {
        let max_len = self.config.text_config.max_position_embeddings;
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        ids.truncate(max_len);
        while ids.len() < max_len {
            ids.push(self.pad_id);
        }
        Ok(Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?)
    }

    fn to_unit_vec(&self, features: Tensor) -> Result<Vec<f32>> {
        let v: Vec<f32> = features.squeeze(0)?.to_dtype(DType::F32)?.to_vec1()?;
        Ok(normalize(v))
    }
}

impl ImageEmbedder for ClipEmbedder {
    fn dim(&self) -> usize {
        CLIP_DIM
    }

    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let pixels = self.preprocess(image)?;
        let features = self.model.get_image_features(&pixels)?;
        self.to_unit_vec(features)
    }
}

impl TextEmbedder for ClipEmbedder {
    fn dim(&self) -> usize {
        CLIP_DIM
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let ids = self.tokenize(text)?;
        let features = self.model.get_text_features(&ids)?;
        self.to_unit_vec(features)
    }
}

pub(crate) fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
    for x in &mut v {
        *x /= norm;
    }
    v
}
