use image::{DynamicImage, Rgb, RgbImage};

use stylesearch_core::traits::{ImageEmbedder, TextEmbedder};
use stylesearch_core::AppConfig;
use stylesearch_embed::{default_embedders, HashEmbedder};

fn solid_image(r: u8, g: u8, b: u8) -> DynamicImage {
    let mut img = RgbImage::new(64, 64);
    for pixel in img.pixels_mut() {
        *pixel = Rgb([r, g, b]);
    }
    DynamicImage::ImageRgb8(img)
}

#[test]
fn hash_text_embedder_shape_and_determinism() {
    let embedder = HashEmbedder::new(512);
    let v1 = embedder.embed_text("red running shoes").expect("embed");
    let v2 = embedder.embed_text("red running shoes").expect("embed");

    assert_eq!(v1.len(), 512);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn hash_text_embedder_separates_distinct_inputs() {
    let embedder = HashEmbedder::new(512);
    let a = embedder.embed_text("leather handbag").expect("embed");
    let b = embedder.embed_text("steel wristwatch").expect("embed");
    assert_ne!(a, b);
}

#[test]
fn hash_image_embedder_shape_and_determinism() {
    let embedder = HashEmbedder::new(512);
    let img = solid_image(200, 30, 30);
    let v1 = embedder.embed_image(&img).expect("embed");
    let v2 = embedder.embed_image(&img).expect("embed");

    assert_eq!(v1.len(), 512);
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3);
    assert_eq!(v1, v2);
}

#[test]
fn hash_image_embedder_separates_distinct_images() {
    let embedder = HashEmbedder::new(512);
    let red = embedder.embed_image(&solid_image(220, 20, 20)).expect("embed");
    let blue = embedder.embed_image(&solid_image(20, 20, 220)).expect("embed");
    assert_ne!(red, blue);
}

#[test]
fn default_embedders_honor_fake_env() {
    // Force hashing embedders to avoid loading model weights
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let config = AppConfig::default();
    let (image_embedder, text_embedder) = default_embedders(&config).expect("embedders");
    assert_eq!(image_embedder.dim(), config.embedding_dim);
    assert_eq!(text_embedder.dim(), config.embedding_dim);

    let v = text_embedder.embed_text("denim jacket").expect("embed");
    assert_eq!(v.len(), config.embedding_dim);
}
